//! The downloadable sample file listing the expected columns.

use std::io::Write;

use anyhow::{Context, Result};
use log::info;

use crate::{cli::TemplateArgs, io_utils};

pub const TEMPLATE_HEADERS: [&str; 6] = ["name", "email", "phone", "company", "address", "notes"];

const TEMPLATE_ROWS: [[&str; 6]; 2] = [
    [
        "Jane Doe",
        "jane.doe@example.com",
        "+1 555 0100",
        "Acme Corp",
        "123 Main St, Springfield",
        "Prefers email contact",
    ],
    [
        "John Smith",
        "john.smith@example.com",
        "+1 555 0101",
        "Globex Inc",
        "456 Oak Ave, Shelbyville",
        "",
    ],
];

pub fn render_template() -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer
        .write_record(TEMPLATE_HEADERS)
        .context("Writing template headers")?;
    for row in TEMPLATE_ROWS {
        writer.write_record(row).context("Writing template row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("Finishing template: {}", err.error()))?;
    String::from_utf8(bytes).context("Template is not valid UTF-8")
}

pub fn execute(args: &TemplateArgs) -> Result<()> {
    let rendered = render_template()?;
    let mut output = io_utils::open_output(args.output.as_deref())?;
    output
        .write_all(rendered.as_bytes())
        .context("Writing template")?;
    output.flush().context("Flushing template")?;
    info!(
        "Template written to {}",
        io_utils::describe_destination(args.output.as_deref())
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mapping::auto_map, tokenizer::tokenize};

    #[test]
    fn template_has_header_and_two_rows() {
        let rendered = render_template().unwrap();
        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some("name,email,phone,company,address,notes"));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn template_round_trips_through_the_auto_mapper() {
        let file = tokenize(&render_template().unwrap()).unwrap();
        let mapping = auto_map(&file.headers);
        assert!(mapping.ignored_columns(&file.headers).is_empty());
        assert_eq!(file.rows[0].get(4), "123 Main St, Springfield");
    }
}
