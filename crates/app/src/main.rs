use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use flashdeck_core::codec::{self, ColumnMask, DelimiterConfig, FieldDelimiter, RecordDelimiter};
use flashdeck_core::derive_name;
use flashdeck_core::model::{CustomFieldDef, CustomFieldRegistry, DeckDraft, MAX_CUSTOM_FIELDS};
use services::DeckCreateService;
use storage::repository::Storage;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidFieldDelimiter { raw: String },
    InvalidRecordDelimiter { raw: String },
    UnknownColumn { raw: String },
    MissingTitle,
    TooManyFields { count: usize },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidFieldDelimiter { raw } => {
                write!(f, "invalid field delimiter: {raw}")
            }
            ArgsError::InvalidRecordDelimiter { raw } => {
                write!(f, "invalid record delimiter: {raw}")
            }
            ArgsError::UnknownColumn { raw } => write!(f, "unknown column: {raw}"),
            ArgsError::MissingTitle => write!(f, "import requires --title"),
            ArgsError::TooManyFields { count } => write!(
                f,
                "--fields lists {count} labels; at most {MAX_CUSTOM_FIELDS} are allowed"
            ),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app preview [--field-delim <d>] [--record-delim <d>] [--fields <labels>]  < text");
    eprintln!("  app convert [input flags] [--to-field-delim <d>] [--to-record-delim <d>]");
    eprintln!("              [--columns front,back,<field>...]  < text");
    eprintln!("  app import  [input flags] --title <title> [--public]  < text");
    eprintln!();
    eprintln!("Delimiters:");
    eprintln!("  field:  tab | comma | pipe | semicolon | custom:<text>");
    eprintln!("  record: newline | double-newline | custom:<text>");
    eprintln!("  \\t and \\n inside custom text are unescaped.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  FLASHDECK_FIELD_DELIM, FLASHDECK_RECORD_DELIM, FLASHDECK_FIELDS");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Preview,
    Convert,
    Import,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "preview" => Some(Self::Preview),
            "convert" => Some(Self::Convert),
            "import" => Some(Self::Import),
            _ => None,
        }
    }
}

struct Args {
    input: DelimiterConfig,
    registry: CustomFieldRegistry,
    output: DelimiterConfig,
    columns: Option<Vec<String>>,
    title: Option<String>,
    is_public: bool,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let field = std::env::var("FLASHDECK_FIELD_DELIM")
            .ok()
            .map(|raw| parse_field_delimiter(&raw))
            .transpose()?
            .unwrap_or_default();
        let record = std::env::var("FLASHDECK_RECORD_DELIM")
            .ok()
            .map(|raw| parse_record_delimiter(&raw))
            .transpose()?
            .unwrap_or_default();
        let fields = std::env::var("FLASHDECK_FIELDS").unwrap_or_default();

        let mut parsed = Self {
            input: DelimiterConfig::new(field, record),
            registry: registry_from_labels(&fields)?,
            output: DelimiterConfig::default(),
            columns: None,
            title: None,
            is_public: false,
        };
        let mut output_field = None;
        let mut output_record = None;

        while let Some(arg) = args.next() {
            match (arg.as_str(), cmd) {
                ("--field-delim", _) => {
                    let value = require_value(args, "--field-delim")?;
                    parsed.input.field = parse_field_delimiter(&value)?;
                }
                ("--record-delim", _) => {
                    let value = require_value(args, "--record-delim")?;
                    parsed.input.record = parse_record_delimiter(&value)?;
                }
                ("--fields", _) => {
                    let value = require_value(args, "--fields")?;
                    parsed.registry = registry_from_labels(&value)?;
                }
                ("--to-field-delim", Command::Convert) => {
                    let value = require_value(args, "--to-field-delim")?;
                    output_field = Some(parse_field_delimiter(&value)?);
                }
                ("--to-record-delim", Command::Convert) => {
                    let value = require_value(args, "--to-record-delim")?;
                    output_record = Some(parse_record_delimiter(&value)?);
                }
                ("--columns", Command::Convert) => {
                    let value = require_value(args, "--columns")?;
                    parsed.columns = Some(split_list(&value));
                }
                ("--title", Command::Import) => {
                    parsed.title = Some(require_value(args, "--title")?);
                }
                ("--public", Command::Import) => parsed.is_public = true,
                ("--help" | "-h", _) => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        parsed.output = DelimiterConfig::new(
            output_field.unwrap_or_else(|| parsed.input.field.clone()),
            output_record.unwrap_or_else(|| parsed.input.record.clone()),
        );
        let untitled = parsed.title.as_deref().is_none_or(|t| t.trim().is_empty());
        if cmd == Command::Import && untitled {
            return Err(ArgsError::MissingTitle);
        }
        Ok(parsed)
    }

    fn column_mask(&self) -> Result<ColumnMask, ArgsError> {
        let Some(columns) = &self.columns else {
            return Ok(ColumnMask::all(self.registry.len()));
        };

        let mut mask = ColumnMask {
            front: false,
            back: false,
            custom: vec![false; self.registry.len()],
        };
        for column in columns {
            match derive_name(column).as_str() {
                "front" => mask.front = true,
                "back" => mask.back = true,
                name => {
                    let index = self
                        .registry
                        .position(name)
                        .ok_or_else(|| ArgsError::UnknownColumn { raw: column.clone() })?;
                    mask.custom[index] = true;
                }
            }
        }
        Ok(mask)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

fn registry_from_labels(raw: &str) -> Result<CustomFieldRegistry, ArgsError> {
    let labels = split_list(raw);
    if labels.len() > MAX_CUSTOM_FIELDS {
        return Err(ArgsError::TooManyFields {
            count: labels.len(),
        });
    }
    Ok(CustomFieldRegistry::from_defs(
        labels.into_iter().map(CustomFieldDef::from_label).collect(),
    ))
}

/// Draft for `import`: title, visibility and the `--fields` schema.
fn import_draft(parsed: &Args) -> Result<DeckDraft, ArgsError> {
    let mut draft = DeckDraft::new_deck();
    draft.set_title(parsed.title.clone().unwrap_or_default());
    draft.set_public(parsed.is_public);
    for (index, def) in parsed.registry.iter().enumerate() {
        if !draft.add_field() || !draft.set_field_label(index, def.label()) {
            return Err(ArgsError::TooManyFields {
                count: parsed.registry.len(),
            });
        }
    }
    Ok(draft)
}

fn unescape(raw: &str) -> String {
    raw.replace("\\t", "\t").replace("\\n", "\n")
}

fn parse_field_delimiter(raw: &str) -> Result<FieldDelimiter, ArgsError> {
    match raw {
        "tab" => Ok(FieldDelimiter::Tab),
        "comma" => Ok(FieldDelimiter::Comma),
        "pipe" => Ok(FieldDelimiter::Pipe),
        "semicolon" => Ok(FieldDelimiter::Semicolon),
        _ => raw
            .strip_prefix("custom:")
            .map(|custom| FieldDelimiter::Custom(unescape(custom)))
            .ok_or_else(|| ArgsError::InvalidFieldDelimiter { raw: raw.to_owned() }),
    }
}

fn parse_record_delimiter(raw: &str) -> Result<RecordDelimiter, ArgsError> {
    match raw {
        "newline" => Ok(RecordDelimiter::Newline),
        "double-newline" => Ok(RecordDelimiter::DoubleNewline),
        _ => raw
            .strip_prefix("custom:")
            .map(|custom| RecordDelimiter::Custom(unescape(custom)))
            .ok_or_else(|| ArgsError::InvalidRecordDelimiter { raw: raw.to_owned() }),
    }
}

fn read_stdin() -> std::io::Result<String> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let text = read_stdin()?;
    let mut stdout = std::io::stdout().lock();

    match cmd {
        Command::Preview => {
            let preview = codec::preview(&text, &parsed.input, parsed.registry.len());
            serde_json::to_writer_pretty(&mut stdout, &preview)?;
            writeln!(stdout)?;
            if !preview.has_valid_format {
                eprintln!("{}", codec::placeholder(&parsed.input, &parsed.registry));
            }
        }
        Command::Convert => {
            let mask = parsed.column_mask()?;
            let records = codec::parse(&text, &parsed.input, parsed.registry.len());
            let out = codec::serialize(&records, &parsed.output, &parsed.registry, &mask);
            writeln!(stdout, "{out}")?;
        }
        Command::Import => {
            // Nothing persists past this process; the stored deck is echoed.
            let storage = Storage::in_memory();
            let service = DeckCreateService::new(Arc::clone(&storage.decks));

            let draft = import_draft(&parsed)?;
            let deck_id = service
                .create_from_text(&draft, &text, &parsed.input)
                .await?;
            let deck = storage.decks.load_deck(deck_id).await?;
            serde_json::to_writer_pretty(&mut stdout, &deck)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import_args(fields: &str) -> Result<Args, ArgsError> {
        let argv = ["--title", "Animals", "--fields", fields, "--public"];
        Args::parse(Command::Import, &mut argv.into_iter().map(str::to_owned))
    }

    #[test]
    fn fields_beyond_limit_are_rejected() {
        let err = registry_from_labels("a,b,c,d,e,f").unwrap_err();
        assert!(matches!(err, ArgsError::TooManyFields { count: 6 }));
        assert!(matches!(
            import_args("a,b,c,d,e,f"),
            Err(ArgsError::TooManyFields { count: 6 })
        ));
    }

    #[test]
    fn import_draft_carries_every_listed_field() {
        let parsed = import_args("Example, Gender").unwrap();
        let draft = import_draft(&parsed).unwrap();
        assert_eq!(draft.title(), "Animals");
        assert!(draft.is_public());
        assert_eq!(draft.registry().names(), vec!["example", "gender"]);
    }

    #[test]
    fn columns_resolve_by_label() {
        let mut parsed = import_args("Example, Gender").unwrap();
        parsed.columns = Some(split_list("front, Gender"));
        let mask = parsed.column_mask().unwrap();
        assert!(mask.front && !mask.back);
        assert_eq!(mask.custom, vec![false, true]);

        parsed.columns = Some(split_list("notes"));
        assert!(matches!(parsed.column_mask(), Err(ArgsError::UnknownColumn { .. })));
    }

    #[test]
    fn delimiters_parse_named_and_custom() {
        assert_eq!(parse_field_delimiter("pipe").unwrap(), FieldDelimiter::Pipe);
        assert_eq!(
            parse_field_delimiter("custom:\\t|").unwrap(),
            FieldDelimiter::Custom("\t|".into())
        );
        assert_eq!(
            parse_record_delimiter("double-newline").unwrap(),
            RecordDelimiter::DoubleNewline
        );
        assert!(parse_record_delimiter("lines").is_err());
    }
}
