//! The `atelier workshops` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use atelier_roster::ClassroomStore;

pub fn execute(format: String) -> Result<()> {
    let store = ClassroomStore::demo();
    let workshops = store.workshops();

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&workshops)?);
        }
        _ => {
            let mut table = Table::new();
            table.set_header(vec!["ID", "Workshop", "Description", "Students", "Created"]);
            for w in &workshops {
                table.add_row(vec![
                    Cell::new(&w.id),
                    Cell::new(&w.name),
                    Cell::new(&w.description),
                    Cell::new(w.student_count),
                    Cell::new(w.created_at.format("%Y-%m-%d")),
                ]);
            }
            println!("{table}");

            let summary = store.summary();
            println!(
                "\n{} workshops, {} students, {} evaluations recorded",
                summary.workshops, summary.students, summary.evaluations
            );
        }
    }

    Ok(())
}
