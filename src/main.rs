//! 命令列介面
//!
//! `sporadic-mrp plan <input.json>`：讀取 JSON 請求、輸出 JSON 回應。
//! 退出碼：0 成功、2 輸入無效、1 非預期失敗。

use std::process::ExitCode;

use anyhow::Context;

use sporadic_mrp::request;

fn main() -> ExitCode {
    sporadic_mrp::logging::init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("錯誤: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let (command, path) = match args.as_slice() {
        [command, path] => (command.as_str(), path.as_str()),
        _ => {
            eprintln!("用法: sporadic-mrp plan <input.json>");
            return Ok(ExitCode::from(2));
        }
    };

    if command != "plan" {
        eprintln!("未知子命令: {command} (目前僅支援 plan)");
        return Ok(ExitCode::from(2));
    }

    let input = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("無法讀取 {path}: {err}");
            return Ok(ExitCode::from(2));
        }
    };

    let (response, status) = request::handle_json(&input);
    let body = serde_json::to_string(&response).context("序列化回應失敗")?;
    println!("{body}");

    Ok(ExitCode::from(status.exit_code()))
}
