//! Built-in Guidely record types managed through the admin dashboard.

use crate::schema::{FieldDef, FieldKind, RecordSchema};

use FieldKind::{Boolean, Json, Multiline, Number, Text};

pub fn schemas() -> Vec<RecordSchema> {
    vec![
        quiz_questions(),
        colleges(),
        resources(),
        timelines(),
        career_nodes(),
        admin_users(),
    ]
}

pub fn find(table: &str) -> Option<RecordSchema> {
    schemas().into_iter().find(|s| s.table == table)
}

fn quiz_questions() -> RecordSchema {
    RecordSchema {
        title: "Quiz Questions",
        table: "quiz_questions",
        id_field: "id",
        fields: vec![
            FieldDef::new("text", "Question", Text),
            FieldDef::new("choices", "Choices (JSON)", Json),
            FieldDef::new("weight_map", "Weight map (JSON)", Json),
            FieldDef::new("active", "Active", Boolean),
        ],
    }
}

fn colleges() -> RecordSchema {
    RecordSchema {
        title: "Colleges",
        table: "college",
        id_field: "id",
        fields: vec![
            FieldDef::new("name", "Name", Text),
            FieldDef::new("district", "District", Text),
            FieldDef::new("contact", "Contact", Text),
            FieldDef::new("website", "Website", Text),
            FieldDef::new("lat", "Lat", Number),
            FieldDef::new("lng", "Lng", Number),
            FieldDef::new("verified", "Verified", Boolean),
        ],
    }
}

fn resources() -> RecordSchema {
    RecordSchema {
        title: "Resources",
        table: "resources",
        id_field: "id",
        fields: vec![
            FieldDef::new("title", "Title", Text),
            FieldDef::new("source", "Source", Text),
            FieldDef::new("link", "Link", Text),
            FieldDef::new("type", "Type", Text),
            FieldDef::new("tags", "Tags (JSON)", Json),
        ],
    }
}

fn timelines() -> RecordSchema {
    RecordSchema {
        title: "Timelines",
        table: "timelines",
        id_field: "id",
        fields: vec![
            FieldDef::new("title", "Title", Text),
            FieldDef::new("start_date", "Start Date", Text),
            FieldDef::new("end_date", "End Date", Text),
            FieldDef::new("target_streams", "Target streams (JSON)", Json),
            FieldDef::new("target_colleges", "Target colleges (JSON)", Json),
            FieldDef::new("message", "Message", Multiline),
        ],
    }
}

fn career_nodes() -> RecordSchema {
    RecordSchema {
        title: "Career Nodes",
        table: "career_nodes",
        id_field: "id",
        fields: vec![
            FieldDef::new("title", "Title", Text),
            FieldDef::new("description", "Description", Multiline),
            FieldDef::new("skills", "Skills (JSON)", Json),
            FieldDef::new("salary_range", "Salary range", Text),
            FieldDef::new("related_courses", "Related courses (JSON)", Json),
            FieldDef::new("related_exams", "Related exams (JSON)", Json),
        ],
    }
}

fn admin_users() -> RecordSchema {
    RecordSchema {
        title: "Admin Users",
        table: "admin_users",
        id_field: "id",
        fields: vec![
            FieldDef::new("email", "Email", Text),
            FieldDef::new("role", "Role (superadmin/content-editor/analytics-viewer)", Text),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tables_are_unique() {
        let all = schemas();
        let tables: HashSet<_> = all.iter().map(|s| s.table).collect();
        assert_eq!(tables.len(), all.len());
    }

    #[test]
    fn field_keys_are_unique_within_each_schema() {
        for schema in schemas() {
            let keys: HashSet<_> = schema.fields.iter().map(|f| f.key).collect();
            assert_eq!(keys.len(), schema.fields.len(), "{}", schema.table);
        }
    }

    #[test]
    fn find_is_by_table_name() {
        assert_eq!(find("college").unwrap().title, "Colleges");
        assert!(find("nope").is_none());
    }
}
