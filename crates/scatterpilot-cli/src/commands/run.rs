//! Run command - replay a scripted conversation.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use scatterpilot_core::{
    ChatRequest, ChatResponse, ConversationStore, InvoiceRecord, ScatterConfig, Turn,
};

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Script file: one user message per line, `#` starts a comment line
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Emit the whole transcript instead of the final reply
    #[arg(long)]
    transcript: bool,

    /// Report invoice validation issues
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Everything a replayed script produced.
pub struct ScriptOutcome {
    pub conversation_id: Option<String>,
    pub responses: Vec<ChatResponse>,
    pub transcript: Vec<Turn>,
    pub invoice: Option<InvoiceRecord>,
}

impl ScriptOutcome {
    pub fn last_response(&self) -> Option<&ChatResponse> {
        self.responses.last()
    }
}

pub async fn run(args: RunArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Script file not found: {}", args.input.display());
    }

    info!("Running script: {}", args.input.display());
    let script = fs::read_to_string(&args.input)?;
    let outcome = run_script(&script, &config)?;

    if args.validate {
        if let Some(invoice) = &outcome.invoice {
            let issues = invoice.validate();
            if !issues.is_empty() {
                eprintln!("{}", style("Validation issues:").yellow());
                for issue in &issues {
                    eprintln!("  - {}", issue);
                }
            }
        }
    }

    let output = if args.transcript {
        format_transcript(&outcome.transcript, args.format)?
    } else {
        format_outcome(&outcome, args.format)?
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total run time: {:?}", start.elapsed());

    Ok(())
}

/// Feed every non-blank, non-comment line of `script` through one fresh
/// conversation.
pub fn run_script(script: &str, config: &ScatterConfig) -> anyhow::Result<ScriptOutcome> {
    let mut store = ConversationStore::new(config.clone());
    let mut conversation_id: Option<String> = None;
    let mut responses = Vec::new();

    let lines = script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    for (number, line) in lines.enumerate() {
        let response = store
            .handle(ChatRequest::new(line, conversation_id.clone()))
            .map_err(|e| anyhow::anyhow!("message {} rejected: {}", number + 1, e))?;
        conversation_id = Some(response.conversation_id.clone());
        responses.push(response);
    }

    let engine = conversation_id.as_deref().and_then(|id| store.get(id));
    let transcript = engine.map(|e| e.transcript().to_vec()).unwrap_or_default();
    let invoice = engine.and_then(|e| e.state().invoice.clone());

    Ok(ScriptOutcome {
        conversation_id,
        responses,
        transcript,
        invoice,
    })
}

pub fn format_outcome(outcome: &ScriptOutcome, format: OutputFormat) -> anyhow::Result<String> {
    let Some(last) = outcome.last_response() else {
        anyhow::bail!("Script contains no messages");
    };

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(last)?),
        OutputFormat::Csv => match &outcome.invoice {
            Some(invoice) => format_csv(invoice),
            None => anyhow::bail!("Conversation did not produce an invoice; CSV needs one"),
        },
        OutputFormat::Text => Ok(format_text(last, outcome.invoice.as_ref())),
    }
}

fn format_transcript(transcript: &[Turn], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(transcript)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(["role", "content"])?;
            for turn in transcript {
                wtr.write_record([turn.role.as_str(), turn.content.as_str()])?;
            }
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        OutputFormat::Text => {
            let mut output = String::new();
            for turn in transcript {
                output.push_str(&format!("{}: {}\n", turn.role.as_str(), turn.content));
            }
            Ok(output)
        }
    }
}

/// One CSV row per line item.
pub fn format_csv(invoice: &InvoiceRecord) -> anyhow::Result<String> {
    let data = invoice.to_data();
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "invoice_number",
        "customer_name",
        "invoice_date",
        "due_date",
        "description",
        "quantity",
        "unit_price",
        "line_total",
        "subtotal",
        "tax_amount",
        "discount",
        "total",
    ])?;

    for item in &data.line_items {
        wtr.write_record([
            &data.invoice_number,
            &data.customer_name,
            &data.invoice_date,
            &data.due_date,
            &item.description,
            &item.quantity,
            &item.unit_price,
            &item.total,
            &data.subtotal,
            &data.tax_amount,
            &data.discount,
            &data.total,
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

pub fn format_text(last: &ChatResponse, invoice: Option<&InvoiceRecord>) -> String {
    let mut output = String::new();

    output.push_str(&format!("Conversation: {}\n", last.conversation_id));
    output.push_str(&format!("{}\n", last.message));

    if let Some(invoice) = invoice {
        let data = invoice.to_data();
        output.push('\n');
        output.push_str(&format!("Invoice: {}\n", data.invoice_number));
        output.push_str(&format!("Customer: {}\n", data.customer_name));
        output.push_str(&format!("Date: {}  Due: {}\n", data.invoice_date, data.due_date));
        output.push('\n');

        output.push_str("Items:\n");
        for item in &data.line_items {
            output.push_str(&format!(
                "  {} x {} @ {} = {}\n",
                item.quantity, item.description, item.unit_price, item.total
            ));
        }
        output.push('\n');

        output.push_str(&format!("  Subtotal: {}\n", data.subtotal));
        output.push_str(&format!("  Tax:      {}\n", data.tax_amount));
        output.push_str(&format!("  Discount: {}\n", data.discount));
        output.push_str(&format!("  Total:    {}\n", data.total));

        if let Some(notes) = &data.notes {
            output.push_str(&format!("\nNotes: {}\n", notes));
        }
    }

    output
}
