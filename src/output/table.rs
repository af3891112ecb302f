//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Format data as a table
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Tabled)]
    struct TestRow {
        #[tabled(rename = "MONTH")]
        month: String,
        #[tabled(rename = "ENERGY (MWh)")]
        energy: String,
    }

    fn row(month: &str, energy: &str) -> TestRow {
        TestRow {
            month: month.to_string(),
            energy: energy.to_string(),
        }
    }

    #[test]
    fn test_format_table_empty() {
        let items: Vec<TestRow> = vec![];
        let result = format_table(&items);
        assert_eq!(result, "No results found.");
    }

    #[test]
    fn test_format_table_single_row() {
        let result = format_table(&[row("Apr 2024", "75.00")]);

        assert!(result.contains("MONTH"));
        assert!(result.contains("ENERGY (MWh)"));
        assert!(result.contains("Apr 2024"));
        assert!(result.contains("75.00"));
    }

    #[test]
    fn test_format_table_keeps_row_order() {
        let result = format_table(&[row("Jul 2024", "1"), row("Aug 2024", "2")]);

        let jul = result.find("Jul 2024").unwrap();
        let aug = result.find("Aug 2024").unwrap();
        assert!(jul < aug);
    }

    #[test]
    fn test_format_table_uses_rounded_style() {
        let result = format_table(&[row("Jan 2025", "0.00")]);

        // Rounded style uses ╭ for top-left corner
        assert!(result.contains("╭"));
        assert!(result.contains("╰"));
    }
}
