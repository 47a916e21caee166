//! The `atelier students` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use atelier_roster::ClassroomStore;

use super::describe_grade;

pub fn execute(workshop_id: String, search: Option<String>, format: String) -> Result<()> {
    let store = ClassroomStore::demo();
    let workshop = store
        .workshop(&workshop_id)
        .ok_or_else(|| anyhow::anyhow!("unknown workshop: {workshop_id}"))?;

    let students = match &search {
        Some(term) => store.search_students(&workshop_id, term)?,
        None => store.students(&workshop_id)?,
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&students)?);
        return Ok(());
    }

    println!("{}: {} students", workshop.name, workshop.student_count);

    if students.is_empty() {
        match search {
            Some(term) => println!("No student matches \"{term}\"."),
            None => println!("No students yet."),
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "", "Name", "Last grade", "Last evaluated"]);
    for s in &students {
        table.add_row(vec![
            Cell::new(&s.id),
            Cell::new(s.initials()),
            Cell::new(&s.name),
            Cell::new(describe_grade(s.last_grade)),
            Cell::new(
                s.last_evaluated_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    println!("{table}");

    Ok(())
}
