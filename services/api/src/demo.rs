use crate::infra::{InMemoryObjectStore, LoggingNotifier};
use clap::Args;
use family_onboarding::config::OnboardingConfig;
use family_onboarding::error::AppError;
use family_onboarding::workflows::onboarding::{
    completeness, DeliveryOutcome, DocumentField, DocumentSlot, GuardianDocumentField,
    LockOutcome, MemberUpdate, NomineeTextField, OnboardingSession, SubmissionOrchestrator,
    SubmissionReceipt, TextField,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Write the assembled archive to this path.
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryObjectStore::default());
    let notifier = Arc::new(LoggingNotifier::default());
    let orchestrator =
        SubmissionOrchestrator::new(store.clone(), notifier.clone(), OnboardingConfig::default());

    println!("Family onboarding demo");
    let mut session = OnboardingSession::new();
    session.confirm_family("Meera Iyer", 38, 2)?;

    for update in head_updates() {
        session.apply(0, update)?;
    }
    for update in child_updates() {
        session.apply(1, update)?;
    }

    for (index, member) in session.registry().members().iter().enumerate() {
        let missing = completeness::missing_requirements(member);
        let status = if missing.is_empty() {
            "complete".to_string()
        } else {
            format!("missing {}", completeness::describe(&missing))
        };
        println!(
            "- Member {}: {} (age {}, {}) {status}",
            index + 1,
            member.name(),
            member.age(),
            member.kind().label()
        );
    }

    loop {
        match session.lock_active()? {
            LockOutcome::Advanced { next_index } => {
                println!("Locked member; moving to member {}", next_index + 1);
            }
            LockOutcome::ReadyForSubmission => {
                println!("All members locked; ready for submission");
                break;
            }
        }
    }

    let receipt = orchestrator.submit(&mut session)?;

    if let Some(archive) = session.archive() {
        println!("\nArchive {} ({} bytes)", archive.file_name, archive.bytes.len());
        for entry in &archive.entries {
            println!("  {entry}");
        }
        for (index, manifest) in &archive.manifests {
            println!("\ndetails.txt for member {}:\n{manifest}", index + 1);
        }

        if let Some(path) = args.output {
            std::fs::write(&path, &archive.bytes)?;
            println!("Archive written to {}", path.display());
        }
    }

    render_receipt(&receipt);
    println!("Stored objects: {}", store.paths().join(", "));
    println!(
        "Emails queued: {}",
        notifier
            .outbox()
            .iter()
            .map(|message| message.to.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}

fn render_receipt(receipt: &SubmissionReceipt) {
    println!("\nSubmission receipt ({})", receipt.submitted_at.to_rfc3339());
    println!("- Archive: {} ({} entries)", receipt.archive_name, receipt.entry_count);
    println!("- Upload: {}", describe_outcome(&receipt.upload));
    println!("- Admin email: {}", describe_outcome(&receipt.admin_notice));
    match &receipt.applicant_notice {
        Some(outcome) => println!("- Applicant email: {}", describe_outcome(outcome)),
        None => println!("- Applicant email: no adult email on file"),
    }
}

fn describe_outcome(outcome: &DeliveryOutcome) -> String {
    match outcome {
        DeliveryOutcome::Delivered {
            reference: Some(reference),
        } => format!("delivered ({reference})"),
        DeliveryOutcome::Delivered { reference: None } => "delivered".to_string(),
        DeliveryOutcome::Failed { reason } => format!("failed: {reason}"),
    }
}

fn sample(filename: &str) -> DocumentSlot {
    DocumentSlot::uploaded(filename, format!("sample contents of {filename}").into_bytes())
}

fn head_updates() -> Vec<MemberUpdate> {
    let text = |field, value: &str| MemberUpdate::SetText {
        field,
        value: value.to_string(),
    };
    vec![
        MemberUpdate::SetDocument {
            field: DocumentField::EAadhaar,
            document: sample("e-aadhaar.pdf"),
        },
        MemberUpdate::SetDocument {
            field: DocumentField::PanCard,
            document: sample("pan-card.pdf"),
        },
        MemberUpdate::SetDocument {
            field: DocumentField::BankProof,
            document: sample("cancelled-cheque.jpg"),
        },
        MemberUpdate::SetAvatar {
            document: sample("passport-photo.jpg"),
        },
        text(TextField::Email, "meera.iyer@example.com"),
        text(TextField::Phone, "9840012345"),
        text(TextField::MotherName, "Saraswathi Iyer"),
        text(TextField::PlaceOfBirth, "Coimbatore"),
        MemberUpdate::SetNomineeText {
            nominee: 0,
            field: NomineeTextField::Name,
            value: "Kavya Iyer".to_string(),
        },
        MemberUpdate::SetNomineeText {
            nominee: 0,
            field: NomineeTextField::Relation,
            value: "Daughter".to_string(),
        },
    ]
}

fn child_updates() -> Vec<MemberUpdate> {
    vec![
        MemberUpdate::SetName {
            name: "Kavya Iyer".to_string(),
        },
        MemberUpdate::SetAge { age: 8 },
        MemberUpdate::SetDocument {
            field: DocumentField::BirthCertificate,
            document: sample("birth-certificate.pdf"),
        },
        MemberUpdate::SetGuardianDocument {
            guardian: 0,
            field: GuardianDocumentField::Pan,
            document: sample("meera-pan.pdf"),
        },
        MemberUpdate::SetGuardianDocument {
            guardian: 0,
            field: GuardianDocumentField::Aadhaar,
            document: sample("meera-aadhaar.pdf"),
        },
    ]
}
