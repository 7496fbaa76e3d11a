// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use doc_http::config::{self, Config, OutputConfig, OutputKind};
use doc_http::output::build_outputs;
use doc_http::{capture, proxy, AggregateOptions, Documenter, Recorder};

#[derive(Parser, Debug)]
#[command(name = "doc-http", about = "Document an HTTP API from captured traffic")]
struct Args {
    /// Listen address, e.g. 127.0.0.1:3000 (overrides the config file)
    #[arg(long)]
    listen: Option<String>,

    /// Path to append captured entries as JSONL (overrides the config file)
    #[arg(long)]
    captures: Option<String>,

    /// Optional config TOML path
    #[arg(long)]
    config: Option<String>,

    /// Output descriptor, e.g. "plaintext;markdown,file:api.md,apiary,Shop"
    #[arg(long)]
    output: Option<String>,

    /// Render a captures JSONL file and exit instead of running the proxy
    #[arg(long, value_name = "CAPTURES.jsonl")]
    render: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut cfg = load_config(args.config.as_deref()).await?;
    if let Some(listen) = &args.listen {
        cfg.general.listen = listen.clone();
    }
    if let Some(captures) = &args.captures {
        cfg.general.captures = Some(captures.clone());
    }

    let outputs = build_outputs(&resolve_outputs(args.output.as_deref(), &cfg)?)?;
    let options = cfg.aggregate_options();

    if let Some(path) = &args.render {
        return render_captures(path, outputs, options).await;
    }

    let addr = cfg.listen_addr()?;
    let recorder = Recorder::new(cfg.general.successful_only);
    let captures = match &cfg.general.captures {
        Some(p) => Some(capture::CaptureWriter::new(p).await?),
        None => None,
    };
    let documenter = Documenter::new(recorder.clone(), outputs).with_options(options);

    let server = proxy::run_proxy(addr, recorder, captures, Arc::new(cfg));

    tokio::select! {
        res = server => {
            if let Err(e) = res {
                error!(%e, "server error");
            }
        }
        _ = signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    documenter.output()?;
    Ok(())
}

/// A config file that fails to parse or validate stops the program; only a
/// missing `--config` falls back to defaults.
async fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load_from_path(p)
            .await
            .with_context(|| format!("failed to load config '{}'", p)),
        None => Ok(Config::default()),
    }
}

/// The `--output` descriptor wins over the config file; with neither, a
/// single plaintext output goes to stdout.
fn resolve_outputs(descriptor: Option<&str>, cfg: &Config) -> anyhow::Result<Vec<OutputConfig>> {
    let outputs = match descriptor {
        Some(d) => config::parse_descriptor(d)?,
        None => cfg.all_outputs()?,
    };
    if outputs.is_empty() {
        return Ok(vec![OutputConfig::new(OutputKind::Plaintext)]);
    }
    Ok(outputs)
}

async fn render_captures(
    path: &str,
    outputs: Vec<doc_http::output::Output>,
    options: AggregateOptions,
) -> anyhow::Result<()> {
    let entries = capture::load_captures(path).await?;
    info!(%path, count = entries.len(), "loaded captures");

    let recorder = Recorder::new(false);
    for entry in entries {
        recorder.record(entry);
    }
    Documenter::new(recorder, outputs)
        .with_options(options)
        .output()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_http::output::{Destination, Output, SharedBuffer};
    use doc_http::Entry;
    use rstest::rstest;
    use tokio::fs;
    use uuid::Uuid;

    #[tokio::test]
    async fn main_cli_config_loads_toml() -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("doc_main_cli_cfg_{}.toml", Uuid::new_v4()));
        let toml = r#"[general]
outputs = "markdown,stdout,apiary,Shop"

[aggregation]
threshold = 0.5
"#;
        fs::write(&tmp, toml).await?;

        let cfg = load_config(tmp.to_str()).await?;
        assert_eq!(cfg.aggregate_options().threshold, 0.5);

        let outputs = resolve_outputs(None, &cfg)?;
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].kind, OutputKind::Markdown);
        assert_eq!(outputs[0].title, "Shop");

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn main_no_config_uses_defaults() -> anyhow::Result<()> {
        let cfg = load_config(None).await?;
        assert_eq!(cfg.general.listen, "127.0.0.1:3000");
        assert!(cfg.general.captures.is_none());
        Ok(())
    }

    #[rstest]
    #[case("[aggregation]\nthreshold = 2.0\n", "threshold")]
    #[case("[[outputs]]\nkind = \"markdown\"\ndestination = \"tcp:1\"\n", "no valid output found")]
    #[case("[general]\nlisten = \"nowhere\"\n", "invalid listen address")]
    #[tokio::test]
    async fn main_invalid_config_is_fatal(
        #[case] toml: &str,
        #[case] reason: &str,
    ) -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("doc_main_bad_cfg_{}.toml", Uuid::new_v4()));
        fs::write(&tmp, toml).await?;
        let result = load_config(tmp.to_str()).await;
        let _ = fs::remove_file(&tmp).await;

        let err = match result {
            Ok(cfg) => anyhow::bail!("invalid config was accepted: {:?}", cfg.all_outputs()),
            Err(e) => e,
        };
        assert!(format!("{:#}", err).contains(reason), "{:#}", err);
        Ok(())
    }

    #[tokio::test]
    async fn main_missing_config_file_is_fatal() {
        let tmp = std::env::temp_dir().join(format!("doc_main_missing_{}.toml", Uuid::new_v4()));
        assert!(load_config(tmp.to_str()).await.is_err());
    }

    #[test]
    fn descriptor_overrides_config_outputs() -> anyhow::Result<()> {
        let cfg = Config::from_toml("[[outputs]]\nkind = \"markdown\"\n")?;
        let outputs = resolve_outputs(Some("plaintext,file:out.txt"), &cfg)?;
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].kind, OutputKind::Plaintext);
        assert_eq!(outputs[0].destination, "file:out.txt");
        Ok(())
    }

    #[test]
    fn no_outputs_defaults_to_plaintext_stdout() -> anyhow::Result<()> {
        let outputs = resolve_outputs(Some("html"), &Config::default())?;
        assert_eq!(outputs, vec![OutputConfig::new(OutputKind::Plaintext)]);
        Ok(())
    }

    #[tokio::test]
    async fn render_captures_renders_every_entry() -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("doc_main_render_{}.jsonl", Uuid::new_v4()));
        let cw = capture::CaptureWriter::new(&tmp).await?;
        cw.write_entry(&Entry::new("GET", "/ok".parse()?, 200)).await?;
        cw.write_entry(&Entry::new("GET", "/gone".parse()?, 410)).await?;

        let buffer = SharedBuffer::new();
        let outputs = vec![Output::plaintext(Destination::Buffer(buffer.clone()))];
        render_captures(
            tmp.to_str().ok_or_else(|| anyhow::anyhow!("temp path not utf8"))?,
            outputs,
            AggregateOptions::default(),
        )
        .await?;

        let text = buffer.to_string_lossy();
        assert!(text.contains("GET 410 - /gone\n"));
        assert!(text.contains("GET 200 - /ok\n"));

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }
}
