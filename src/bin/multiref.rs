//! multiref CLI: inspect and rewrite SOAP multi-ref documents.

use clap::{Args, Parser, Subcommand, ValueEnum};
use multiref::lexical;
use multiref::{
    decode_str_collecting, encode_to_string, CollectEvents, Decoded, DecodeOptions, Diagnostic,
    EncodeOptions, EncodingStyle, Object, Primitive, Registry, UntypedElement, Value,
};
use serde_json::{json, Map};
use std::io::{IsTerminal, Read};
use std::process;

#[derive(Parser)]
#[command(name = "multiref", about = "SOAP multi-reference documents: inspect and rewrite")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a document and print the object graph as JSON
    Inspect(InspectArgs),
    /// List the declared ids and whether each one is referenced
    Ids(DecodeArgs),
    /// Decode a document and write it again
    Reencode(ReencodeArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum Style {
    Soap11,
    Soap12,
}

impl From<Style> for EncodingStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Soap11 => EncodingStyle::Soap11,
            Style::Soap12 => EncodingStyle::Soap12,
        }
    }
}

#[derive(Args)]
struct DecodeArgs {
    /// Input file (- for stdin)
    input: String,

    /// Wire style of the input
    #[arg(long, value_enum, default_value = "soap11")]
    style: Style,

    /// Only accept the attributes of --style (default: both styles)
    #[arg(long)]
    strict: bool,

    /// Root is the element marked root="1" instead of the first element
    #[arg(long)]
    root_attribute: bool,
}

#[derive(Args)]
struct InspectArgs {
    #[command(flatten)]
    decode: DecodeArgs,

    /// Pretty-printed JSON output (2-space indent)
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct ReencodeArgs {
    #[command(flatten)]
    decode: DecodeArgs,

    /// Wire style of the output (default: same as --style)
    #[arg(long, value_enum)]
    output_style: Option<Style>,

    /// Indented XML output (2-space indent)
    #[arg(long)]
    pretty: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Fehler: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Inspect(args) => run_inspect(args),
        Command::Ids(args) => run_ids(args),
        Command::Reencode(args) => run_reencode(args),
    }
}

fn read_input(path: &str) -> Result<String, String> {
    if path == "-" {
        if std::io::stdin().is_terminal() {
            eprintln!("Lese von stdin (Ctrl+D zum Beenden)...");
        }
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Lesefehler (stdin): {e}"))?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("Lesefehler '{}': {e}", path))
    }
}

/// Ohne Registry: alles ohne xsi:type wird als Untyped erfasst.
fn decode(args: &DecodeArgs, registry: &Registry) -> Result<(Decoded, CollectEvents), String> {
    let xml = read_input(&args.input)?;
    let mut options = DecodeOptions::default().with_style(args.style.into());
    if args.strict {
        options = options.with_strict_style();
    }
    if args.root_attribute {
        options = options.with_root_attribute();
    }
    decode_str_collecting(&xml, registry, &options).map_err(|e| format!("Decode-Fehler: {e}"))
}

fn run_inspect(args: InspectArgs) -> Result<(), String> {
    let registry = Registry::new();
    let (decoded, events) = decode(&args.decode, &registry)?;

    let objects: Vec<serde_json::Value> = decoded
        .graph
        .iter()
        .map(|(handle, object)| {
            let mut entry = object_json(object, &registry);
            entry["handle"] = json!(handle.index());
            entry
        })
        .collect();
    let doc = json!({
        "root": value_json(&decoded.root),
        "objects": objects,
        "diagnostics": events.diagnostics.iter().map(diagnostic_json).collect::<Vec<_>>(),
    });

    let out = if args.pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    }
    .map_err(|e| format!("JSON-Fehler: {e}"))?;
    println!("{out}");
    Ok(())
}

fn run_ids(args: DecodeArgs) -> Result<(), String> {
    let (decoded, _) = decode(&args, &Registry::new())?;
    for (id, target) in decoded.references.targets() {
        let state = if target.referenced { "referenced" } else { "unreferenced" };
        match target.position {
            Some(pos) => println!("{id}\t{state}\t{pos}"),
            None => println!("{id}\t{state}"),
        }
    }
    Ok(())
}

fn run_reencode(args: ReencodeArgs) -> Result<(), String> {
    let registry = Registry::new();
    let (decoded, events) = decode(&args.decode, &registry)?;
    for d in &events.diagnostics {
        if let Diagnostic::UnreferencedObject { id, .. } = d {
            eprintln!("Hinweis: Objekt {} wird nicht referenziert und entfaellt", id.as_deref().unwrap_or("(ohne id)"));
        }
    }

    let mut options = EncodeOptions::default().with_style(args.output_style.unwrap_or(args.decode.style).into());
    if args.pretty {
        options = options.with_indent(2);
    }
    let xml = encode_to_string(&decoded.graph, &decoded.root, &registry, &options)
        .map_err(|e| format!("Encode-Fehler: {e}"))?;
    println!("{xml}");
    Ok(())
}

// ============================================================================
// JSON
// ============================================================================

fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Primitive(p) => json!({ "type": p.kind().type_name(), "value": primitive_text(p) }),
        Value::Enum(e) => json!({ "enum": e.value }),
        Value::Object(handle) => json!({ "ref": handle.index() }),
    }
}

fn primitive_text(p: &Primitive) -> String {
    match p {
        Primitive::QName(q) => q.to_string(),
        // QName ist oben behandelt, der Callback wird nie gerufen
        other => lexical::format(other, &mut |ns| Ok(ns.to_string())).unwrap_or_default(),
    }
}

fn object_json(object: &Object, registry: &Registry) -> serde_json::Value {
    match object {
        Object::Struct { def, fields } => {
            let fields: Map<String, serde_json::Value> =
                fields.iter().map(|(name, v)| (name.clone(), value_json(v))).collect();
            json!({ "kind": "struct", "type": registry.struct_def(*def).name.to_string(), "fields": fields })
        }
        Object::Array { element_type, items } => json!({
            "kind": "array",
            "itemType": registry.display(element_type),
            "items": items.iter().map(value_json).collect::<Vec<_>>(),
        }),
        Object::Untyped(element) => {
            let mut entry = untyped_json(element);
            entry["kind"] = json!("untyped");
            entry
        }
    }
}

fn untyped_json(element: &UntypedElement) -> serde_json::Value {
    let attributes: Map<String, serde_json::Value> = element
        .attributes
        .iter()
        .map(|(name, value)| (name.to_string(), json!(value)))
        .collect();
    json!({
        "element": element.name.to_string(),
        "xsiType": element.type_name.as_ref().map(|t| t.to_string()),
        "attributes": attributes,
        "text": element.text.trim(),
        "children": element.children.iter().map(untyped_json).collect::<Vec<_>>(),
    })
}

fn diagnostic_json(diagnostic: &Diagnostic) -> serde_json::Value {
    match diagnostic {
        Diagnostic::UnknownElement { name, position } => json!({
            "kind": "unknownElement",
            "name": name.to_string(),
            "position": position.to_string(),
        }),
        Diagnostic::UnknownAttribute { name, value, position } => json!({
            "kind": "unknownAttribute",
            "name": name.to_string(),
            "value": value,
            "position": position.to_string(),
        }),
        Diagnostic::UnreferencedObject { id, value, position } => json!({
            "kind": "unreferencedObject",
            "id": id,
            "value": value_json(value),
            "position": position.map(|p| p.to_string()),
        }),
    }
}
