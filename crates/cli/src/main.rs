use std::path::Path;

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::{Arg, ArgAction, ArgMatches, Command};
use courier_api::{TransportError, WebSocketListener};
use courier_engine::{
    Argument, DispatchOutput, Dispatcher, HttpInterface, InvocationEngine, MethodDeclaration, MultipartStrategy,
    ParamDeclaration, RequestParts, ServiceProxy, VerbMarker,
};
use courier_types::{FilePart, ParamType, ReturnKind, Verb};
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{Level, error, info};

/// Every method takes its URL per call, so the templates stay empty.
struct Demo {
    engine: InvocationEngine,
}

impl HttpInterface for Demo {
    fn declarations() -> Vec<MethodDeclaration> {
        let url = || ParamDeclaration::new(ParamType::STRING).url();
        let headers = || ParamDeclaration::new(ParamType::Map).header("");
        let fields = || ParamDeclaration::new(ParamType::Map);
        vec![
            MethodDeclaration::with_verb("get", VerbMarker::get(""))
                .param(url())
                .param(headers())
                .param(fields())
                .returns(ReturnKind::Text),
            MethodDeclaration::with_verb("post", VerbMarker::post(""))
                .param(url())
                .param(headers())
                .param(fields())
                .returns(ReturnKind::Text),
            MethodDeclaration::with_verb("upload", VerbMarker::post("").strategy::<MultipartStrategy>())
                .param(url())
                .param(headers())
                .param(fields())
                .param(ParamDeclaration::new(ParamType::ProgressListener))
                .returns(ReturnKind::Text),
            MethodDeclaration::with_verb("ws", VerbMarker::websocket(""))
                .param(url())
                .param(ParamDeclaration::new(ParamType::WebSocketListener))
                .returns(ReturnKind::WebSocket),
        ]
    }
}

impl ServiceProxy for Demo {
    fn from_engine(engine: InvocationEngine) -> Self {
        Self { engine }
    }
}

impl Demo {
    async fn text(&self, method: &str, args: Vec<Argument>) -> Result<String> {
        self.engine
            .invoke(method, args)
            .await?
            .into_text()
            .with_context(|| format!("{} returned no body", method))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();
    let dispatcher = Dispatcher::global();
    let demo = dispatcher.get_instance::<Demo>()?;

    let (name, sub) = matches.subcommand().context("expected a subcommand")?;
    let url = sub.get_one::<String>("url").context("missing url")?.clone();
    match name {
        "request" => {
            let verb: Verb = sub.get_one::<String>("verb").context("missing verb")?.parse()?;
            if verb == Verb::WebSocket {
                bail!("use the ws subcommand to open a WebSocket");
            }
            let mut parts = RequestParts::new();
            for (key, value) in key_values(sub, "header")? {
                parts = parts.header(key, value);
            }
            for (key, value) in key_values(sub, "field")? {
                parts = parts.field(key, json_or_string(&value));
            }
            match dispatcher.requests().request(verb, &url, parts).await? {
                DispatchOutput::Response(mut response) => {
                    eprintln!("{} {}", response.status().as_u16(), response.status_message());
                    println!("{}", response.text().await?);
                }
                other => bail!("unexpected {} output", other.kind()),
            }
        }
        "get" | "post" => {
            let headers = Argument::Map(parse_pairs(sub, "header")?);
            let fields = Argument::Map(parse_pairs(sub, "field")?);
            println!("{}", demo.text(name, vec![url.into(), headers, fields]).await?);
        }
        "upload" => {
            let headers = Argument::Map(parse_pairs(sub, "header")?);
            let mut fields = parse_pairs(sub, "field")?;
            let files = read_files(sub)?;
            if !files.is_empty() {
                fields.insert("file".to_string(), Argument::Files(files));
            }
            let progress = Argument::progress(|total: u64, sent: u64| eprintln!("uploaded {}/{} bytes", sent, total));
            let text = demo
                .text("upload", vec![url.into(), headers, Argument::Map(fields), progress])
                .await?;
            println!("{}", text);
        }
        "ws" => run_websocket(&demo, url, sub).await?,
        other => bail!("unsupported subcommand: {}", other),
    }
    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    let url = Arg::new("url").required(true).help("Request URL (relative URLs use the configured base URL)");
    let header = Arg::new("header")
        .long("header")
        .short('H')
        .action(ArgAction::Append)
        .value_name("KEY=VALUE")
        .help("Request header");
    let field = Arg::new("field")
        .long("field")
        .short('f')
        .action(ArgAction::Append)
        .value_name("KEY=VALUE")
        .help("Body or query field; JSON values are sent as JSON");

    Command::new("courier")
        .about("Issue declarative HTTP and WebSocket calls")
        .subcommand_required(true)
        .subcommand(
            Command::new("request")
                .about("Send a request with any HTTP verb through the direct request API")
                .arg(Arg::new("verb").required(true).value_name("VERB").help("GET, HEAD, POST, PUT, PATCH or DELETE"))
                .arg(url.clone())
                .arg(header.clone())
                .arg(field.clone()),
        )
        .subcommand(
            Command::new("get")
                .about("GET with fields in the query string")
                .arg(url.clone())
                .arg(header.clone())
                .arg(field.clone()),
        )
        .subcommand(
            Command::new("post")
                .about("POST with fields as a JSON body")
                .arg(url.clone())
                .arg(header.clone())
                .arg(field.clone()),
        )
        .subcommand(
            Command::new("upload")
                .about("POST a multipart body with files")
                .arg(url.clone())
                .arg(header)
                .arg(field)
                .arg(
                    Arg::new("file")
                        .long("file")
                        .action(ArgAction::Append)
                        .value_name("PATH")
                        .help("File to upload under the 'file' field"),
                ),
        )
        .subcommand(
            Command::new("ws")
                .about("Open a WebSocket and print text frames")
                .arg(url)
                .arg(
                    Arg::new("send")
                        .long("send")
                        .action(ArgAction::Append)
                        .value_name("TEXT")
                        .help("Text frame to send once connected"),
                ),
        )
}

fn key_values(matches: &ArgMatches, id: &str) -> Result<Vec<(String, String)>> {
    matches
        .get_many::<String>(id)
        .into_iter()
        .flatten()
        .map(|raw| match raw.split_once('=') {
            Some((key, value)) => Ok((key.trim().to_string(), value.to_string())),
            None => bail!("expected KEY=VALUE for --{}, got '{}'", id, raw),
        })
        .collect()
}

fn json_or_string(value: &str) -> Value {
    serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn parse_pairs(matches: &ArgMatches, id: &str) -> Result<IndexMap<String, Argument>> {
    Ok(key_values(matches, id)?
        .into_iter()
        .map(|(key, value)| (key, Argument::Json(json_or_string(&value))))
        .collect())
}

fn read_files(matches: &ArgMatches) -> Result<Vec<FilePart>> {
    matches
        .get_many::<String>("file")
        .into_iter()
        .flatten()
        .map(|path| FilePart::from_path(Path::new(path)).with_context(|| format!("failed to read {}", path)))
        .collect()
}

struct PrintListener {
    done: mpsc::UnboundedSender<()>,
}

impl WebSocketListener for PrintListener {
    fn on_open(&self) {
        info!("websocket connected");
    }

    fn on_text(&self, text: &str) {
        println!("{}", text);
    }

    fn on_binary(&self, data: &Bytes) {
        println!("<{} binary bytes>", data.len());
    }

    fn on_closed(&self, code: u16, reason: &str) {
        info!(code, reason, "websocket closed");
        let _ = self.done.send(());
    }

    fn on_failure(&self, error: &TransportError) {
        error!(%error, "websocket failed");
        let _ = self.done.send(());
    }
}

async fn run_websocket(demo: &Demo, url: String, matches: &ArgMatches) -> Result<()> {
    let (done, mut finished) = mpsc::unbounded_channel();
    let listener = Argument::websocket_listener(PrintListener { done });
    let handle = demo
        .engine
        .invoke("ws", vec![url.into(), listener])
        .await?
        .into_websocket()
        .context("ws returned no connection")?;

    for text in matches.get_many::<String>("send").into_iter().flatten() {
        handle.send_text(text.clone())?;
    }

    tokio::select! {
        _ = finished.recv() => {}
        _ = tokio::signal::ctrl_c() => {
            handle.close(1000, "bye")?;
            let _ = finished.recv().await;
        }
    }
    Ok(())
}
