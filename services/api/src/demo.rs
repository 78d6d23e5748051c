use crate::infra::{InMemoryMatterRepository, InMemoryReminderScheduler};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use probate_desk::error::AppError;
use probate_desk::workflows::documents::{DocumentGenerator, DocumentService, HeadlessChromium};
use probate_desk::workflows::estate::{GrantType, RawMatterRecord};
use probate_desk::workflows::fees::{format_money, FeeBreakdown, FeeSchedule};
use probate_desk::workflows::matter::{
    Actor, ActorRole, Matter, MatterAction, MatterId, MatterRepository, MatterService,
    MatterServiceError, MatterTimeline, ReminderKind, TransitionError,
};
use probate_desk::workflows::qualification::{
    calculate_tier_recommendation, evaluate_qualification, CollectedData, QualificationFlags,
};
use rust_decimal::Decimal;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct FeesArgs {
    /// Gross value of the estate in dollars
    #[arg(long)]
    pub(crate) estate_value: Decimal,
    /// Override the $200 filing fee
    #[arg(long)]
    pub(crate) filing_fee: Option<Decimal>,
    /// Bracket table CSV (lower,upper,rate_per_thousand[,label])
    #[arg(long)]
    pub(crate) schedule: Option<PathBuf>,
    /// Print the breakdown as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Day the demo matter opens (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Write generated documents into this directory.
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn run_fees(args: FeesArgs) -> Result<(), AppError> {
    let FeesArgs {
        estate_value,
        filing_fee,
        schedule,
        json,
    } = args;

    let filing_fee = filing_fee.unwrap_or_else(|| Decimal::from(200));
    let schedule = match schedule {
        Some(path) => FeeSchedule::from_path(path, filing_fee)?,
        None => FeeSchedule::british_columbia().with_filing_fee(filing_fee),
    };
    let breakdown = schedule.calculate(estate_value);

    if json {
        match serde_json::to_string_pretty(&breakdown) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => println!("Fee breakdown unavailable: {err}"),
        }
    } else {
        render_fees(&breakdown);
    }
    Ok(())
}

fn render_fees(breakdown: &FeeBreakdown) {
    println!("Estate value: {}", format_money(breakdown.estate_value));
    for bracket in &breakdown.brackets {
        println!(
            "  {:<20} {:>12}  ({})",
            bracket.label,
            format_money(bracket.amount),
            bracket.detail
        );
    }
    println!("  {:<20} {:>12}", "Filing fee", format_money(breakdown.filing_fee));
    println!("  {:<20} {:>12}", "Total", format_money(breakdown.total));
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { start, output_dir } = args;
    let start = start.unwrap_or_else(|| Local::now().date_naive());
    let opened_at = morning(start);

    println!("Probate desk demo");

    let estate_value = Decimal::from(750_000);
    println!("\nCourt fees");
    render_fees(&FeeSchedule::default().calculate(estate_value));

    println!("\nScreening");
    let flags = QualificationFlags::default();
    let qualification = evaluate_qualification(&flags);
    println!(
        "  Result: {:?} -> {:?}",
        qualification.result, qualification.recommended_action
    );
    let collected = CollectedData {
        estate_value,
        has_real_property: true,
        beneficiary_count: 2,
        grant_type: GrantType::Administration,
    };
    let tier = calculate_tier_recommendation(&collected, &flags);
    println!(
        "  Recommended tier: {} at {}",
        tier.tier.label(),
        format_money(tier.price)
    );
    for line in &tier.reasoning {
        println!("  - {line}");
    }

    let repository = Arc::new(InMemoryMatterRepository::default());
    let reminders = Arc::new(InMemoryReminderScheduler::default());
    let matter_id = MatterId("demo-001".to_string());
    if let Err(err) = repository.insert(
        Matter::new(matter_id.clone(), "PP-DEMO-001", "client-demo").with_intake(demo_intake()),
    ) {
        println!("  Demo matter could not be stored: {err}");
        return Ok(());
    }

    let matters = MatterService::new(repository.clone(), reminders.clone());
    let client = Actor {
        user_id: "client-demo".to_string(),
        role: ActorRole::Client,
    };

    println!("\nMatter timeline");
    let steps = [
        (MatterAction::CompleteIntake, 0),
        (MatterAction::ConfirmWillSearchMailed, 1),
        (MatterAction::ConfirmWillSearchResults, 15),
        (MatterAction::ConfirmNoticesMailed, 16),
        (MatterAction::ConfirmProbateFiled, 26),
        (MatterAction::ConfirmProbateFiled, 37),
    ];
    for (action, day) in steps {
        let now = opened_at + Duration::days(day);
        match matters.perform(&matter_id, action, &client, now) {
            Ok(timeline) => render_timeline(now, action, &timeline),
            Err(MatterServiceError::Transition(TransitionError::WaitingPeriodActive {
                days_remaining,
                earliest_filing_date,
            })) => println!(
                "  {}  {:?} refused: {} day(s) left, filing opens {}",
                now.date_naive(),
                action,
                days_remaining,
                earliest_filing_date
            ),
            Err(err) => println!("  {}  {:?} failed: {err}", now.date_naive(), action),
        }
    }
    if let Some(due_at) = reminders.due_at(&matter_id, ReminderKind::FilingWindowOpen) {
        println!("  Filing reminder scheduled for {}", due_at.date_naive());
    }

    println!("\nDocuments");
    let generator = DocumentGenerator::new(
        FeeSchedule::default(),
        Arc::new(HeadlessChromium::new("chromium")),
    );
    let documents = DocumentService::new(repository, generator);
    match documents.review(&matter_id) {
        Ok(review) => println!(
            "  Estate review: valid={} errors={} warnings={}",
            review.validation.valid,
            review.validation.errors.len(),
            review.validation.warnings.len()
        ),
        Err(err) => println!("  Estate review unavailable: {err}"),
    }

    if let Some(dir) = &output_dir {
        std::fs::create_dir_all(dir)?;
    }
    for form in ["p1", "p10", "cover_letter_notice", "p11"] {
        match documents.generate(&matter_id, form, start) {
            Ok(document) => {
                println!(
                    "  {:<22} {} ({} bytes, {} warning(s))",
                    form,
                    document.file_name,
                    document.bytes.len(),
                    document.warnings.len()
                );
                if let Some(dir) = &output_dir {
                    std::fs::write(dir.join(&document.file_name), &document.bytes)?;
                }
            }
            Err(err) => println!("  {:<22} not generated: {err}", form),
        }
    }

    Ok(())
}

fn morning(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(9, 0, 0)
        .and_then(|naive| Utc.from_local_datetime(&naive).single())
        .unwrap_or_else(Utc::now)
}

fn render_timeline(now: DateTime<Utc>, action: MatterAction, timeline: &MatterTimeline) {
    let countdown = match (timeline.days_remaining, timeline.can_file) {
        (Some(days), false) => format!(", {days} day(s) until filing"),
        (Some(_), true) => ", filing open".to_string(),
        (None, _) => String::new(),
    };
    println!(
        "  {}  {:?} -> {}{}",
        now.date_naive(),
        action,
        timeline.status_label,
        countdown
    );
}

fn demo_intake() -> RawMatterRecord {
    RawMatterRecord::from_json(&json!({
        "caseCode": "PP-DEMO-001",
        "hasWill": false,
        "deceased": {
            "fullName": "Eleanor Mae Whitfield",
            "dateOfBirth": "1938-02-14",
            "dateOfDeath": "2024-01-09",
            "occupation": "Retired teacher",
            "address": {
                "street": "1120 Fort St",
                "city": "Victoria",
                "province": "BC",
                "postalCode": "V8V 3K8"
            }
        },
        "executors": [{
            "fullName": "Thomas Whitfield",
            "relationship": "son",
            "isPrimary": true,
            "email": "thomas@example.com",
            "address": { "street": "42 Oak Bay Ave", "city": "Victoria", "postalCode": "V8S 1J4" }
        }],
        "intestateHeirs": [
            { "fullName": "Thomas Whitfield", "relationship": "son" },
            { "fullName": "Grace Whitfield-Lee", "relationship": "daughter" }
        ],
        "assets": [
            {
                "category": "real_property",
                "description": "1120 Fort St, Victoria",
                "value": "600000",
                "isRealProperty": true
            },
            { "category": "bank", "description": "Chequing and savings", "value": "$150,000" }
        ],
        "liabilities": [
            { "description": "Final utility and credit card balances", "amount": "2,500" }
        ],
        "registry": "Victoria"
    }))
}
