use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub avatar: String,
}

impl Person {
    pub fn new(name: &str, avatar: &str) -> Self {
        Person {
            name: name.to_string(),
            avatar: avatar.to_string(),
        }
    }
}

/// One row of the sheet. Every field is free text, nothing is validated.
/// Field order is the order used when exporting.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub job: String,
    pub date: String,
    pub status: String,
    pub submitter: Person,
    pub url: String,
    pub assigned: Person,
    pub priority: String,
    pub due: String,
    pub value: String,
}

impl Record {
    /// A record with only the job text set.
    pub fn with_job(job: &str) -> Self {
        Record {
            job: job.to_string(),
            ..Default::default()
        }
    }

    /// Text shown in the cell of `column`. Nested people render as their name.
    pub fn cell(&self, column: Column) -> &str {
        match column {
            Column::Job => &self.job,
            Column::Submitted => &self.date,
            Column::Status => &self.status,
            Column::Submitter => &self.submitter.name,
            Column::Url => &self.url,
            Column::Assigned => &self.assigned.name,
            Column::Priority => &self.priority,
            Column::Due => &self.due,
            Column::Value => &self.value,
        }
    }
}

/// The sortable display columns. The row number column is not one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Job,
    Submitted,
    Status,
    Submitter,
    Url,
    Assigned,
    Priority,
    Due,
    Value,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Job,
        Column::Submitted,
        Column::Status,
        Column::Submitter,
        Column::Url,
        Column::Assigned,
        Column::Priority,
        Column::Due,
        Column::Value,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Column::Job => "Job Request",
            Column::Submitted => "Submitted",
            Column::Status => "Status",
            Column::Submitter => "Submitter",
            Column::Url => "URL",
            Column::Assigned => "Assigned",
            Column::Priority => "Priority",
            Column::Due => "Due Date",
            Column::Value => "Est. Value",
        }
    }

    /// Column by display position, `1` being the first column after `#`.
    pub fn from_position(pos: usize) -> Option<Column> {
        pos.checked_sub(1).and_then(|idx| Column::ALL.get(idx).copied())
    }

    pub fn index(&self) -> usize {
        Column::ALL.iter().position(|c| c == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    InProcess,
    NeedToStart,
    Complete,
    Blocked,
    Other,
}

impl StatusKind {
    pub fn classify(status: &str) -> Self {
        match status {
            "In-process" => StatusKind::InProcess,
            "Need to start" => StatusKind::NeedToStart,
            "Complete" => StatusKind::Complete,
            "Blocked" => StatusKind::Blocked,
            _ => StatusKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityKind {
    High,
    Medium,
    Other,
}

impl PriorityKind {
    // Anything that is not High or Medium renders like Low.
    pub fn classify(priority: &str) -> Self {
        match priority {
            "High" => PriorityKind::High,
            "Medium" => PriorityKind::Medium,
            _ => PriorityKind::Other,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn sample(
    job: &str,
    date: &str,
    status: &str,
    submitter: Person,
    url: &str,
    assigned: Person,
    priority: &str,
    due: &str,
    value: &str,
) -> Record {
    Record {
        job: job.to_string(),
        date: date.to_string(),
        status: status.to_string(),
        submitter,
        url: url.to_string(),
        assigned,
        priority: priority.to_string(),
        due: due.to_string(),
        value: value.to_string(),
    }
}

/// Rows the sheet starts with when no data file is given.
pub fn sample_data() -> Vec<Record> {
    vec![
        sample(
            "Launch social media campaign",
            "15-11-2024",
            "In-process",
            Person::new("Aisha Patel", "A"),
            "www.aishapatel.com",
            Person::new("Sophie Choudhury", "S"),
            "Medium",
            "20-11-2024",
            "₹6,200,000",
        ),
        sample(
            "Update press kit for company redesign",
            "28-10-2024",
            "Need to start",
            Person::new("Irfan Khan", "I"),
            "www.irfankhanpage.com",
            Person::new("Tejas Pandey", "T"),
            "High",
            "30-10-2024",
            "₹3,500,000",
        ),
        sample(
            "Finalize user testing feedback for app",
            "05-12-2024",
            "In-process",
            Person::new("Mark Johnson", "M"),
            "www.markjohnson.dev",
            Person::new("Rachel Lee", "R"),
            "Medium",
            "10-12-2024",
            "₹4,750,000",
        ),
        sample(
            "Design new features for the website",
            "10-01-2025",
            "Complete",
            Person::new("Emily Green", "E"),
            "www.emilygreen.io",
            Person::new("Tom Wright", "T"),
            "Low",
            "15-01-2025",
            "₹5,900,000",
        ),
        sample(
            "Prepare financial report for Q4",
            "25-01-2025",
            "Blocked",
            Person::new("Jessica Brown", "J"),
            "www.jessicabrown.org",
            Person::new("Kevin Smith", "K"),
            "Low",
            "30-01-2025",
            "₹2,800,000",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_columns_use_the_name() {
        let record = &sample_data()[0];
        assert_eq!(record.cell(Column::Submitter), "Aisha Patel");
        assert_eq!(record.cell(Column::Assigned), "Sophie Choudhury");
        assert_eq!(record.cell(Column::Value), "₹6,200,000");
    }

    #[test]
    fn column_positions_skip_the_index_column() {
        assert_eq!(Column::from_position(0), None);
        assert_eq!(Column::from_position(1), Some(Column::Job));
        assert_eq!(Column::from_position(9), Some(Column::Value));
        assert_eq!(Column::from_position(10), None);
        assert_eq!(Column::Due.index(), 7);
    }

    #[test]
    fn default_record_is_all_empty() {
        let record = Record::default();
        assert!(Column::ALL.iter().all(|c| record.cell(*c).is_empty()));
        assert_eq!(record.submitter, Person::new("", ""));
        assert_eq!(record.assigned.avatar, "");
    }

    #[test]
    fn status_and_priority_classification() {
        assert_eq!(StatusKind::classify("Blocked"), StatusKind::Blocked);
        assert_eq!(StatusKind::classify("blocked"), StatusKind::Other);
        assert_eq!(PriorityKind::classify("High"), PriorityKind::High);
        assert_eq!(PriorityKind::classify(""), PriorityKind::Other);
    }
}
