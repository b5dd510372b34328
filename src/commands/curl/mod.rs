//! `curl`.
//!
//! The only network-capable command. Requests go through the injected
//! [`HttpClient`]; the sandbox's network policy (enabled flag plus host
//! allow-list) is enforced before the client is ever called.

use std::collections::HashMap;

use crate::net::{host_allowed, url_host, HttpError, HttpRequest};

use super::{Command, CommandContext, CommandResult};

pub struct CurlCommand;

struct CurlOptions {
    request: HttpRequest,
    silent: bool,
    include_headers: bool,
    head_only: bool,
    fail_on_error: bool,
    output: Option<String>,
}

impl Command for CurlCommand {
    fn name(&self) -> &'static str {
        "curl"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let options = match parse_options(&ctx.args) {
            Ok(options) => options,
            Err(message) => return CommandResult::error_with_code(format!("curl: {}\n", message), 2),
        };

        let Some(host) = url_host(&options.request.url) else {
            return CommandResult::error_with_code(
                format!("curl: (3) URL rejected: {}\n", options.request.url),
                3,
            );
        };

        if !ctx.network.enabled {
            return CommandResult::error_with_code(
                "curl: (6) network access is disabled in this sandbox\n",
                6,
            );
        }
        if !host_allowed(&host, &ctx.network.allow_list) {
            return CommandResult::error_with_code(
                format!("curl: (6) host not in allow-list: {}\n", host),
                6,
            );
        }
        let Some(client) = &ctx.http else {
            return CommandResult::error_with_code("curl: (6) no HTTP client configured\n", 6);
        };

        match client.fetch(&options.request) {
            Ok(response) => {
                let mut stdout = String::new();
                if options.include_headers || options.head_only {
                    stdout.push_str(&format!("HTTP/1.1 {}\r\n", response.status));
                    for (name, value) in &response.headers {
                        stdout.push_str(&format!("{}: {}\r\n", name, value));
                    }
                    stdout.push_str("\r\n");
                }
                if !options.head_only {
                    match &options.output {
                        Some(path) => {
                            let resolved = ctx.absolute(path);
                            if let Err(e) = ctx.fs.write_file(&resolved, response.body.as_bytes())
                            {
                                return CommandResult::error_with_code(
                                    format!("curl: (23) failed writing {}: {}\n", path, e.reason()),
                                    23,
                                );
                            }
                        }
                        None => stdout.push_str(&response.body),
                    }
                }
                if options.fail_on_error && response.status >= 400 {
                    let stderr = if options.silent {
                        String::new()
                    } else {
                        format!("curl: (22) The requested URL returned error: {}\n", response.status)
                    };
                    return CommandResult::with_exit_code(String::new(), stderr, 22);
                }
                CommandResult::success(stdout)
            }
            Err(error) => {
                let (code, message) = match &error {
                    HttpError::Timeout => (28, format!("(28) {}", error)),
                    HttpError::ConnectionRefused => (7, format!("(7) {}", error)),
                    HttpError::DnsFailure => (6, format!("(6) {} {}", error, host)),
                    HttpError::Other(_) => (35, format!("(35) {}", error)),
                };
                let stderr =
                    if options.silent { String::new() } else { format!("curl: {}\n", message) };
                CommandResult::error_with_code(stderr, code)
            }
        }
    }
}

fn parse_options(argv: &[String]) -> Result<CurlOptions, String> {
    let mut options = CurlOptions {
        request: HttpRequest::get(""),
        silent: false,
        include_headers: false,
        head_only: false,
        fail_on_error: false,
        output: None,
    };
    let mut method: Option<String> = None;
    let mut headers: HashMap<String, String> = HashMap::new();
    let mut url: Option<String> = None;

    let mut iter = argv.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-s" | "--silent" => options.silent = true,
            "-i" | "--include" => options.include_headers = true,
            "-I" | "--head" => {
                options.head_only = true;
                method.get_or_insert_with(|| "HEAD".to_string());
            }
            "-L" | "--location" => options.request.follow_redirects = true,
            "-k" | "--insecure" => options.request.insecure = true,
            "-f" | "--fail" => options.fail_on_error = true,
            "-X" | "--request" => {
                method = Some(iter.next().ok_or("option -X: requires parameter")?.clone());
            }
            "-H" | "--header" => {
                let header = iter.next().ok_or("option -H: requires parameter")?;
                if let Some((name, value)) = header.split_once(':') {
                    headers.insert(name.trim().to_lowercase(), value.trim().to_string());
                }
            }
            "-d" | "--data" => {
                let data = iter.next().ok_or("option -d: requires parameter")?.clone();
                options.request.body = Some(data);
                method.get_or_insert_with(|| "POST".to_string());
            }
            "-o" | "--output" => {
                options.output = Some(iter.next().ok_or("option -o: requires parameter")?.clone());
            }
            "--max-time" => {
                let seconds: f64 = iter
                    .next()
                    .ok_or("option --max-time: requires parameter")?
                    .parse()
                    .map_err(|_| "option --max-time: expected a number".to_string())?;
                options.request.timeout_ms = (seconds * 1000.0) as u64;
            }
            other if other.starts_with('-') => {
                return Err(format!("option {}: is unknown", other));
            }
            other => url = Some(other.to_string()),
        }
    }

    options.request.url = url.ok_or("no URL specified")?;
    options.request.method = method.unwrap_or_else(|| "GET".to_string());
    options.request.headers = headers;
    Ok(options)
}
