use crate::infra::{InMemoryIdentityDirectory, InMemorySubmissionStore};
use civic_feedback::error::AppError;
use civic_feedback::portal::{
    FeedbackService, FeedbackServiceError, IntakeAction, IntakeForm, ListQuery, SubmissionCard,
    TrackingOutcome, TriageDecision,
};
use clap::Args;
use std::sync::Arc;

const DEMO_CITIZEN: &str = "resident-demo";
const DEMO_ADMIN: &str = "council-ops";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// File the walkthrough report anonymously.
    #[arg(long)]
    pub(crate) anonymous: bool,
    /// Stop after intake and show the still-pending tracking page.
    #[arg(long)]
    pub(crate) skip_triage: bool,
}

pub(crate) async fn run(args: DemoArgs) -> Result<(), AppError> {
    let directory = InMemoryIdentityDirectory::default();
    let citizen = directory
        .sign_in("demo-citizen-token", DEMO_CITIZEN)
        .map_err(FeedbackServiceError::from)?;
    let operator = directory
        .sign_in("demo-admin-token", DEMO_ADMIN)
        .map_err(FeedbackServiceError::from)?;
    directory
        .grant_admin(DEMO_ADMIN)
        .map_err(FeedbackServiceError::from)?;

    let service = FeedbackService::new(
        Arc::new(InMemorySubmissionStore::default()),
        Arc::new(directory),
    );

    println!("Civic feedback portal demo");
    let report = service
        .submit(
            &citizen,
            IntakeForm {
                title: "Broken streetlight".to_string(),
                description: "The light at Elm and 3rd has been out for 2 weeks".to_string(),
                category: "infrastructure".to_string(),
                is_anonymous: args.anonymous,
            },
            IntakeAction::Submit,
        )
        .await?;
    let badge = report.status.badge();
    println!(
        "- Submitted {} -> {} [{} / {}]",
        report.id.as_str(),
        badge.label,
        badge.emphasis,
        badge.icon
    );
    println!(
        "  Filed {}",
        if report.is_anonymous {
            "anonymously".to_string()
        } else {
            format!("as {DEMO_CITIZEN}")
        }
    );

    let draft = service
        .submit(
            &citizen,
            IntakeForm {
                title: "Library weekend hours".to_string(),
                description: "Opening on Sundays would help students".to_string(),
                category: "education".to_string(),
                is_anonymous: false,
            },
            IntakeAction::SaveDraft,
        )
        .await?;
    println!("- Saved draft {} ({})", draft.id.as_str(), draft.status);
    let promoted = service.promote_draft(&citizen, draft.id.as_str()).await?;
    println!("  Draft submitted -> {}", promoted.status.badge().label);

    if !args.skip_triage {
        println!("\nAdmin triage");
        if let Err(err) = service.authorize_admin(&citizen).await {
            println!("- Citizen refused at the dashboard: {err}");
        }
        let admin = service.authorize_admin(&operator).await?;

        let board = service.triage_board(&admin).await?;
        println!(
            "- Dashboard: {} total | {} pending | {} under review | {} addressed | {} rejected",
            board.stats.total,
            board.stats.pending,
            board.stats.under_review,
            board.stats.addressed,
            board.stats.rejected
        );
        for card in service.list_submissions(&admin, ListQuery::default()).await? {
            println!(
                "  - {} [{}] {} (submitter: {})",
                card.id.as_str(),
                card.category_label,
                card.title,
                submitter_label(&card)
            );
        }

        for (status, response) in [
            ("under_review", None),
            ("addressed", Some("Crew replaced the lamp on 2024-03-01.")),
        ] {
            let outcome = service
                .update_status(
                    &admin,
                    report.id.as_str(),
                    TriageDecision {
                        status: status.to_string(),
                        response_text: response.map(str::to_string),
                    },
                )
                .await?;
            println!(
                "- {} -> {}",
                outcome.submission.id.as_str(),
                outcome.submission.badge.label
            );
        }
    }

    println!("\nPublic tracking");
    match service.track(report.id.as_str()).await? {
        TrackingOutcome::Found(view) => match serde_json::to_string_pretty(&view) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("  Tracking payload unavailable: {err}"),
        },
        TrackingOutcome::NotFound => println!("  Submission not found"),
    }
    if let TrackingOutcome::NotFound = service.track("nonexistent-id").await? {
        println!("- Lookup of nonexistent-id: not found");
    }

    Ok(())
}

/// Anonymous rows hide the submitter; signed-out filers simply have none.
fn submitter_label(card: &SubmissionCard) -> &str {
    match (&card.user_id, card.is_anonymous) {
        (Some(user_id), _) => user_id.as_str(),
        (None, true) => "anonymous",
        (None, false) => "unknown",
    }
}
