use dsr_decode::codec::compressed::Compression;
use dsr_decode::codec::exports::decode_body;
use dsr_decode::schema::Layout;
use dsr_decode::tables::TableKind;
use tracing_subscriber::EnvFilter;

fn parse_arg(args: &[String], name: &str) -> Option<String> {
    for (i, a) in args.iter().enumerate() {
        if let Some(v) = a.strip_prefix(&(name.to_string() + "=")) {
            return Some(v.to_string());
        }
        if a == name {
            return args.get(i + 1).cloned();
        }
    }
    None
}

fn usage() -> &'static str {
    "\
dsr_inspect\n\
\n\
Decode a DSR envelope into rows and print them as JSON.\n\
\n\
Args:\n\
  --input FILE          envelope body (required)\n\
  --table NAME          sc-header | contact | products | facilities | scope-certificate\n\
  --layout FILE         JSON layout config, instead of --table\n\
  --compression C       none | gzip | zstd (default: none)\n\
  --max-uncompressed N  (default: 268435456)\n\
  --pretty              indent the JSON output\n\
\n\
Logging is controlled with RUST_LOG (default: dsr_decode=info,warn).\n\
"
}

fn load_layout(args: &[String]) -> Result<Layout, String> {
    match (parse_arg(args, "--table"), parse_arg(args, "--layout")) {
        (Some(_), Some(_)) => Err("pass either --table or --layout, not both".to_string()),
        (Some(name), None) => name
            .parse::<TableKind>()
            .map(|kind| kind.layout())
            .map_err(|e| e.to_string()),
        (None, Some(path)) => {
            let text = std::fs::read_to_string(&path).map_err(|e| format!("{path}: {e}"))?;
            Layout::from_json(&text).map_err(|e| format!("{path}: {e}"))
        }
        (None, None) => Err("missing --table or --layout".to_string()),
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let input = parse_arg(args, "--input").ok_or_else(|| "missing --input".to_string())?;
    let layout = load_layout(args)?;

    let encoding = parse_arg(args, "--compression").unwrap_or_default();
    let compression = Compression::from_content_encoding(&encoding)
        .ok_or_else(|| format!("unknown compression: {encoding}"))?;
    let max_uncompressed_len: usize = match parse_arg(args, "--max-uncompressed") {
        Some(v) => v
            .parse()
            .map_err(|_| format!("invalid --max-uncompressed: {v}"))?,
        None => 256 << 20,
    };

    let body = std::fs::read(&input).map_err(|e| format!("{input}: {e}"))?;
    tracing::info!(
        input = %input,
        bytes = body.len(),
        ?compression,
        "decoding envelope"
    );
    let table = decode_body(&body, compression, max_uncompressed_len, &layout)
        .map_err(|e| e.to_string())?;
    tracing::info!(rows = table.len(), columns = table.columns().len(), "decoded");

    let text = if args.iter().any(|a| a == "--pretty") {
        serde_json::to_string_pretty(&table)
    } else {
        serde_json::to_string(&table)
    }
    .map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprint!("{}", usage());
        std::process::exit(0);
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dsr_decode=info,dsr_inspect=info,warn")),
        )
        .init();

    if let Err(e) = run(&args) {
        tracing::error!("{e}");
        eprintln!("error: {e}\n\n{}", usage());
        std::process::exit(1);
    }
}
