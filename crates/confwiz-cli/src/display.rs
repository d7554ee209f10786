//! Terminal rendering: headers, tables and status lines

use colored::Colorize;
use confwiz_core::FieldDescriptor;
use confwiz_schema::{Catalog, FieldError, StructureDef, ValueMap};
use std::io::{self, Write};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct SchemaRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Type")]
    type_name: String,
    #[tabled(rename = "Required")]
    required: String,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct StructureRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Qualified name")]
    qualified_name: String,
    #[tabled(rename = "Fields")]
    fields: usize,
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Title block before a wizard run
pub fn header(out: &mut dyn Write, verb: &str, title: &str, qualified_name: &str) -> io::Result<()> {
    writeln!(out, "\n{}", format!("{verb}: {title}").bold())?;
    writeln!(out, "{}\n", format!("Class: {qualified_name}").dimmed())
}

/// Field/value table of the collected configuration
pub fn summary(out: &mut dyn Write, title: &str, values: &ValueMap) -> io::Result<()> {
    let rows: Vec<SummaryRow> = values
        .iter()
        .map(|(field, value)| SummaryRow {
            field: field.clone(),
            value: truncate(&value.display_text(), 80),
        })
        .collect();
    writeln!(out, "\n{}", format!("{title} Summary").cyan().bold())?;
    writeln!(out, "{}", Table::new(rows))
}

fn default_text(field: &FieldDescriptor) -> String {
    match field.effective_default() {
        Some(value) if !value.is_null() => value.display_text(),
        _ if field.default().is_none() && field.default_factory().is_some() => "<factory>".to_string(),
        _ => "None".to_string(),
    }
}

/// Field table for one structure
pub fn schema(out: &mut dyn Write, structure: &StructureDef, fields: &[FieldDescriptor]) -> io::Result<()> {
    let rows: Vec<SchemaRow> = fields
        .iter()
        .map(|field| SchemaRow {
            field: field.name().to_string(),
            type_name: field.shape().to_string(),
            required: if !field.is_mutable() {
                "auto"
            } else if field.is_required() {
                "yes"
            } else {
                "no"
            }
            .to_string(),
            default: if field.is_required() { "-".to_string() } else { default_text(field) },
            description: truncate(field.description().unwrap_or_default(), 50),
        })
        .collect();
    writeln!(out, "\n{}", format!("Schema: {}", structure.name()).cyan().bold())?;
    if let Some(description) = structure.description() {
        writeln!(out, "{}", description.dimmed())?;
    }
    writeln!(out, "{}", Table::new(rows))
}

/// Table of every structure in the catalog
pub fn structure_list(out: &mut dyn Write, catalog: &Catalog) -> io::Result<()> {
    if catalog.structures().next().is_none() {
        return writeln!(out, "  {}", "No structures defined".yellow());
    }
    let rows: Vec<StructureRow> = catalog
        .structures()
        .enumerate()
        .map(|(i, s)| StructureRow {
            index: i + 1,
            name: s.name().to_string(),
            qualified_name: s.qualified_name().to_string(),
            fields: s.fields().len(),
        })
        .collect();
    writeln!(out, "\n{}", "Available Structures".cyan().bold())?;
    writeln!(out, "{}", Table::new(rows))
}

/// Validator errors, one line per field path
pub fn validation_errors(out: &mut dyn Write, errors: &[FieldError]) -> io::Result<()> {
    writeln!(out, "\n{}", "Validation Errors:".red().bold())?;
    for error in errors {
        writeln!(out, "  {}: {}", error.loc.breadcrumb().red(), error.message)?;
    }
    Ok(())
}

/// Green status line
pub fn success(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "\n{}", message.green().bold())
}

/// Red status line
pub fn failure(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "\n{}", message.red().bold())
}

#[cfg(test)]
mod tests {
    use super::*;
    use confwiz_core::TypeResolver;
    use confwiz_test_utils::{complex_config, fixture_catalog, map};
    use confwiz_schema::{FieldPath, Value};

    fn render(f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        colored::control::set_override(false);
        let mut buf: Vec<u8> = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn truncation_marks_cut_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }

    #[test]
    fn schema_table_columns() {
        let catalog = fixture_catalog();
        let structure = complex_config();
        let fields = TypeResolver::new(&catalog).introspect(&structure).unwrap();
        let text = render(|out| schema(out, &structure, &fields));
        assert!(text.contains("Schema: ComplexConfig"));
        for column in ["Field", "Type", "Required", "Default", "Description"] {
            assert!(text.contains(column), "missing {column}");
        }
        assert!(text.contains("InnerModel | SimpleConfig | None"));
        assert!(text.contains("balanced"));
    }

    #[test]
    fn summary_and_errors_render_values() {
        let values = map(&[("label", Value::str("x")), ("count", Value::Int(3))]);
        let text = render(|out| summary(out, "SimpleConfig", &values));
        assert!(text.contains("SimpleConfig Summary"));
        assert!(text.contains("label") && text.contains("count"));

        let errors = vec![FieldError::new(FieldPath::single("inner").child("value"), "Too big")];
        let text = render(|out| validation_errors(out, &errors));
        assert!(text.contains("  inner > value: Too big"));
    }

    #[test]
    fn structure_list_counts_fields() {
        let text = render(|out| structure_list(out, &fixture_catalog()));
        assert!(text.contains("demo.SimpleConfig"));
        assert!(text.contains("Qualified name"));
    }
}
