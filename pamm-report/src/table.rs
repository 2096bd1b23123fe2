use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};

/// Bordered table with a header row.
pub fn data_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers);
    table
}

/// Right-aligned cell for numbers.
pub fn cell_right(content: impl ToString) -> Cell {
    Cell::new(content).set_alignment(CellAlignment::Right)
}

/// Print with a 2-space indent.
pub fn print_table(table: &Table) {
    for line in table.lines() {
        println!("  {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_table_renders_rows() {
        let mut table = data_table(&["Client", "Events"]);
        table.add_row(vec![Cell::new("Harmonic"), cell_right("1,234")]);
        let rendered = table.to_string();
        assert!(rendered.contains("Client"));
        assert!(rendered.contains("Harmonic"));
        assert!(rendered.contains("1,234"));
    }
}
