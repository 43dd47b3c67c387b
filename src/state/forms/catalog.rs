//! Form schemas for every entity the console manages

use super::schema::{
    Absent, ClearRule, Constraint, FieldKind, FieldSpec, Guard, Initial, OptionSource,
    ReferenceSource, Requirement, Schema,
};
use crate::state::EntityKind;

pub const APPLICATION_STATUSES: &[&str] = &["Development", "Determination", "Withdrawn", "Determined"];
pub const APPLICATION_OUTCOMES: &[&str] = &["Permitted", "Refused"];
pub const QUOTE_STATUSES: &[&str] = &["Requested", "Received", "Instructed"];
pub const TASK_STATUSES: &[&str] = &["not_started", "pending", "in_progress", "completed"];
pub const TASK_PRIORITIES: &[&str] = &["low", "medium", "high"];

const WITHDRAWN: Guard = Guard::Equals {
    field: "status",
    value: "Withdrawn",
};

const DETERMINED: Guard = Guard::Equals {
    field: "status",
    value: "Determined",
};

static PROJECT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        requirement: Requirement::Always("Project code is required"),
        constraints: &[Constraint::Pattern {
            pattern: r"^[A-Z0-9]{4}$",
            message: "Project code must be 4 uppercase letters or numbers",
        }],
        locked_on_edit: true,
        help: "Enter 4 uppercase letters or numbers",
        ..FieldSpec::text("project_code", "Project Code")
    },
    FieldSpec {
        requirement: Requirement::Always("Project name is required"),
        constraints: &[
            Constraint::MinLength(3, "Project name must be at least 3 characters"),
            Constraint::MaxLength(100, "Project name must be at most 100 characters"),
        ],
        help: "Enter a unique project name",
        ..FieldSpec::text("project_name", "Project Name")
    },
    FieldSpec {
        kind: FieldKind::Text { multiline: true },
        constraints: &[Constraint::MaxLength(
            500,
            "Description must be at most 500 characters",
        )],
        help: "Optional: Provide a brief description of the project",
        ..FieldSpec::text("description", "Description")
    },
    FieldSpec {
        kind: FieldKind::Flag,
        initial: Initial::Flag(false),
        ..FieldSpec::text("archived", "Archive Project")
    },
];

static APPLICATION_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        kind: FieldKind::Choice(OptionSource::Reference(ReferenceSource::Projects)),
        requirement: Requirement::Always("Project is required"),
        ..FieldSpec::text("project_code", "Project")
    },
    FieldSpec {
        kind: FieldKind::Choice(OptionSource::Fixed(APPLICATION_STATUSES)),
        initial: Initial::Text("Development"),
        requirement: Requirement::Always("Status is required"),
        constraints: &[Constraint::OneOf("Status must be one of the listed values")],
        ..FieldSpec::text("status", "Status")
    },
    FieldSpec {
        kind: FieldKind::Text { multiline: true },
        requirement: Requirement::When(WITHDRAWN, "Reason for withdrawal is required"),
        visible_when: Some(WITHDRAWN),
        absent: Absent::Null,
        ..FieldSpec::text("reason_withdrawn", "Reason Withdrawn")
    },
    FieldSpec {
        kind: FieldKind::Choice(OptionSource::Fixed(APPLICATION_OUTCOMES)),
        requirement: Requirement::When(DETERMINED, "Outcome is required"),
        constraints: &[Constraint::OneOf("Outcome must be Permitted or Refused")],
        visible_when: Some(DETERMINED),
        absent: Absent::Null,
        ..FieldSpec::text("outcome", "Outcome")
    },
];

static APPLICATION_CLEARS: &[ClearRule] = &[
    ClearRule {
        trigger: "status",
        keep_value: "Withdrawn",
        dependent: "reason_withdrawn",
    },
    ClearRule {
        trigger: "status",
        keep_value: "Determined",
        dependent: "outcome",
    },
];

static QUOTE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        kind: FieldKind::Choice(OptionSource::Reference(ReferenceSource::Applications)),
        absent: Absent::Null,
        ..FieldSpec::text("application_id", "Application")
    },
    FieldSpec {
        kind: FieldKind::Choice(OptionSource::Reference(ReferenceSource::Consultants)),
        absent: Absent::Null,
        ..FieldSpec::text("consultant_id", "Consultant")
    },
    FieldSpec {
        kind: FieldKind::Choice(OptionSource::Fixed(QUOTE_STATUSES)),
        requirement: Requirement::Always("Quote status is required"),
        constraints: &[Constraint::OneOf("Quote status must be one of the listed values")],
        ..FieldSpec::text("quote_status", "Quote Status")
    },
    FieldSpec {
        kind: FieldKind::Date,
        constraints: &[Constraint::IsoDate("Date quoted must be a date (YYYY-MM-DD)")],
        absent: Absent::Null,
        help: "YYYY-MM-DD",
        ..FieldSpec::text("date_quoted", "Date Quoted")
    },
    FieldSpec {
        absent: Absent::Null,
        ..FieldSpec::text("quote_reference", "Quote Reference")
    },
    FieldSpec {
        kind: FieldKind::Decimal,
        constraints: &[Constraint::Decimal {
            min: Some(0.0),
            max: None,
            message: "Fee must be a number of at least 0",
        }],
        absent: Absent::Null,
        help: "Fee excluding VAT",
        ..FieldSpec::text("fee_ex_vat", "Fee (ex VAT)")
    },
];

static TASK_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        requirement: Requirement::Always("Title is required"),
        constraints: &[Constraint::MaxLength(200, "Title must be at most 200 characters")],
        ..FieldSpec::text("title", "Title")
    },
    FieldSpec {
        kind: FieldKind::Text { multiline: true },
        ..FieldSpec::text("description", "Description")
    },
    FieldSpec {
        kind: FieldKind::Choice(OptionSource::Fixed(TASK_STATUSES)),
        initial: Initial::Text("pending"),
        requirement: Requirement::Always("Status is required"),
        constraints: &[Constraint::OneOf("Status must be one of the listed values")],
        ..FieldSpec::text("status", "Status")
    },
    FieldSpec {
        kind: FieldKind::Choice(OptionSource::Fixed(TASK_PRIORITIES)),
        initial: Initial::Text("medium"),
        requirement: Requirement::Always("Priority is required"),
        constraints: &[Constraint::OneOf("Priority must be low, medium or high")],
        ..FieldSpec::text("priority", "Priority")
    },
    FieldSpec {
        kind: FieldKind::Date,
        constraints: &[Constraint::IsoDate("Due date must be a date (YYYY-MM-DD)")],
        absent: Absent::Null,
        help: "YYYY-MM-DD",
        ..FieldSpec::text("due_date", "Due Date")
    },
    FieldSpec {
        absent: Absent::Null,
        help: "Name of the person responsible",
        ..FieldSpec::text("assigned_to", "Assigned To")
    },
    FieldSpec {
        kind: FieldKind::Choice(OptionSource::Reference(ReferenceSource::Projects)),
        absent: Absent::Null,
        ..FieldSpec::text("project_code", "Project")
    },
    FieldSpec {
        kind: FieldKind::Choice(OptionSource::Reference(ReferenceSource::Applications)),
        absent: Absent::Null,
        ..FieldSpec::text("application_id", "Application")
    },
];

static CONSULTANT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        requirement: Requirement::Always("Consultant name is required"),
        constraints: &[Constraint::MaxLength(100, "Name must be at most 100 characters")],
        ..FieldSpec::text("consultant_name", "Name")
    },
    FieldSpec {
        constraints: &[Constraint::Pattern {
            pattern: r"^[^@\s]+@[^@\s]+\.[^@\s]+$",
            message: "Enter a valid email address",
        }],
        absent: Absent::Null,
        ..FieldSpec::text("email_1", "Primary Email")
    },
    FieldSpec {
        constraints: &[Constraint::Pattern {
            pattern: r"^\+?[0-9 ]{7,20}$",
            message: "Enter a valid phone number",
        }],
        absent: Absent::Null,
        ..FieldSpec::text("mobile_1", "Primary Mobile")
    },
    FieldSpec {
        absent: Absent::Null,
        ..FieldSpec::text("website", "Website")
    },
    FieldSpec {
        absent: Absent::Null,
        ..FieldSpec::text("consultancy_name", "Consultancy")
    },
];

static TOPIC_AREA_FIELDS: &[FieldSpec] = &[FieldSpec {
    requirement: Requirement::Always("Topic area is required"),
    constraints: &[Constraint::MaxLength(
        100,
        "Topic area must be at most 100 characters",
    )],
    ..FieldSpec::text("topic_area", "Topic Area")
}];

static PROJECT: Schema = Schema {
    kind: EntityKind::Project,
    fields: PROJECT_FIELDS,
    clear_rules: &[],
};

static APPLICATION: Schema = Schema {
    kind: EntityKind::Application,
    fields: APPLICATION_FIELDS,
    clear_rules: APPLICATION_CLEARS,
};

static QUOTE: Schema = Schema {
    kind: EntityKind::Quote,
    fields: QUOTE_FIELDS,
    clear_rules: &[],
};

static TASK: Schema = Schema {
    kind: EntityKind::Task,
    fields: TASK_FIELDS,
    clear_rules: &[],
};

static CONSULTANT: Schema = Schema {
    kind: EntityKind::Consultant,
    fields: CONSULTANT_FIELDS,
    clear_rules: &[],
};

static TOPIC_AREA: Schema = Schema {
    kind: EntityKind::TopicArea,
    fields: TOPIC_AREA_FIELDS,
    clear_rules: &[],
};

/// The declared schema for an entity kind
pub fn schema_for(kind: EntityKind) -> &'static Schema {
    match kind {
        EntityKind::Project => &PROJECT,
        EntityKind::Application => &APPLICATION,
        EntityKind::Quote => &QUOTE,
        EntityKind::Task => &TASK,
        EntityKind::Consultant => &CONSULTANT,
        EntityKind::TopicArea => &TOPIC_AREA,
    }
}
