use std::sync::Arc;

use crate::invariants::assert_all_ledger_invariants;
use crate::{
    CampaignId, CampaignLedger, CampaignProposal, CampaignStatus, Donation, DonationMethod,
    Evidence, ItemKind, LedgerError, ManualClock, MilestoneProposal, MilestoneStatus,
    ReviewSubmission, Role, WorkPayload,
};

fn setup() -> CampaignLedger {
    CampaignLedger::with_clock(Arc::new(ManualClock::epoch()))
}

fn review(note: &str) -> ReviewSubmission {
    ReviewSubmission {
        volunteer: "Ana Lim".to_string(),
        note: note.to_string(),
        evidence: vec![Evidence::link("visit log", "https://logs.example.org/7")],
    }
}

fn live_campaign(ledger: &mut CampaignLedger, title: &str) -> CampaignId {
    let submitted = ledger
        .submit_campaign(CampaignProposal {
            title: title.to_string(),
            location: "Cebu".to_string(),
            organizer: "Island Relief".to_string(),
            description: String::new(),
            image_url: String::new(),
            goal: 1_000,
            milestones: vec![
                MilestoneProposal {
                    title: "Food packs".to_string(),
                    target: 400,
                },
                MilestoneProposal {
                    title: "Shelter kits".to_string(),
                    target: 600,
                },
            ],
        })
        .unwrap();
    ledger
        .verify_submission(submitted.item_id, review("ok"))
        .unwrap();
    ledger.approve_campaign(submitted.item_id).unwrap();
    submitted.campaign_id
}

fn evidence() -> Vec<Evidence> {
    vec![Evidence::link("news report", "https://news.example.org/fraud")]
}

#[test]
fn test_ngo_request_goes_through_volunteer_then_admin() {
    let mut ledger = setup();
    let campaign_id = live_campaign(&mut ledger, "Typhoon Relief");

    let item = ledger
        .recommend_deletion(campaign_id, Role::Ngo, "Project cancelled", vec![])
        .unwrap();
    assert_eq!(ledger.volunteer_queue().get(item).unwrap().kind(), ItemKind::Deletion);
    assert!(ledger.admin_queue().is_empty());
    assert!(ledger.notifications(Role::Volunteer)[0]
        .message
        .contains("Project cancelled"));

    ledger
        .submit_deletion_review(item, review("confirmed with organizer"))
        .unwrap();
    assert!(!ledger.volunteer_queue().contains(item));
    let forwarded = ledger.admin_queue().get(item).unwrap();
    match &forwarded.payload {
        WorkPayload::Deletion { origin, review, .. } => {
            assert_eq!(*origin, Role::Ngo);
            assert_eq!(review.as_ref().unwrap().note, "confirmed with organizer");
        }
        other => panic!("unexpected payload {other:?}"),
    }

    let removed = ledger.approve_deletion(item).unwrap();
    assert_eq!(removed.id, campaign_id);
    assert_eq!(
        ledger.campaign(campaign_id),
        Err(LedgerError::CampaignNotFound(campaign_id))
    );
    assert!(ledger.admin_queue().is_empty());
    assert!(ledger.notifications(Role::Ngo)[0].message.contains("deleted"));
}

#[test]
fn test_admin_request_goes_to_volunteer_queue() {
    let mut ledger = setup();
    let campaign_id = live_campaign(&mut ledger, "Flood Aid");

    let item = ledger
        .recommend_deletion(campaign_id, Role::Admin, "Reported by donors", evidence())
        .unwrap();
    assert!(ledger.volunteer_queue().contains(item));
    assert!(ledger.admin_queue().is_empty());
    assert!(ledger.notifications(Role::Admin)[0]
        .message
        .contains("Flagged"));
}

#[test]
fn test_volunteer_recommendation_goes_straight_to_admin() {
    let mut ledger = setup();
    let campaign_id = live_campaign(&mut ledger, "Medical Mission");

    let item = ledger
        .recommend_deletion(campaign_id, Role::Volunteer, "Site does not exist", evidence())
        .unwrap();
    assert!(ledger.volunteer_queue().is_empty());
    let queued = ledger.admin_queue().get(item).unwrap();
    match &queued.payload {
        WorkPayload::Deletion {
            origin,
            reason,
            evidence,
            review,
        } => {
            assert_eq!(*origin, Role::Volunteer);
            assert_eq!(reason, "Site does not exist");
            assert_eq!(evidence.len(), 1);
            assert!(review.is_none());
        }
        other => panic!("unexpected payload {other:?}"),
    }
    assert!(ledger.notifications(Role::Admin)[0]
        .message
        .contains("Site does not exist"));
}

#[test]
fn test_admin_dismissal_keeps_campaign_and_notifications() {
    let mut ledger = setup();
    let campaign_id = live_campaign(&mut ledger, "Reforestation");
    ledger
        .donate(campaign_id, Donation::new(250, "0xTREE", DonationMethod::Qr))
        .unwrap();
    let before = ledger.campaign(campaign_id).unwrap().clone();

    let item = ledger
        .recommend_deletion(campaign_id, Role::Volunteer, "Suspicious", vec![])
        .unwrap();
    let ngo_before = ledger.notifications(Role::Ngo).len();
    ledger.dismiss_deletion(item).unwrap();

    assert_eq!(ledger.campaign(campaign_id).unwrap(), &before);
    assert!(ledger.admin_queue().is_empty());
    // The earlier recommendation notice is still there, plus the dismissal.
    let ngo = ledger.notifications(Role::Ngo);
    assert_eq!(ngo.len(), ngo_before + 1);
    assert_eq!(
        ngo[0].message,
        "The deletion recommendation for \"Reforestation\" was dismissed by an admin."
    );
    assert!(ngo.iter().any(|n| n.message.contains("Suspicious")));
}

#[test]
fn test_volunteer_dismissal_closes_request() {
    let mut ledger = setup();
    let campaign_id = live_campaign(&mut ledger, "Library Drive");
    let item = ledger
        .recommend_deletion(campaign_id, Role::Ngo, "Duplicate listing", vec![])
        .unwrap();

    ledger.dismiss_deletion_review(item).unwrap();
    assert_eq!(
        ledger.notifications(Role::Ngo)[0].message,
        "The deletion review for \"Library Drive\" was closed by a volunteer."
    );
    assert!(ledger.volunteer_queue().is_empty());
    assert!(ledger.admin_queue().is_empty());
    assert_eq!(
        ledger.campaign(campaign_id).unwrap().status,
        CampaignStatus::Live
    );

    // Once closed, a new request may be opened.
    assert!(ledger
        .recommend_deletion(campaign_id, Role::Ngo, "Duplicate listing", vec![])
        .is_ok());
}

#[test]
fn test_one_open_deletion_per_campaign() {
    let mut ledger = setup();
    let campaign_id = live_campaign(&mut ledger, "Clinic Upgrade");
    let item = ledger
        .recommend_deletion(campaign_id, Role::Ngo, "first", vec![])
        .unwrap();

    assert_eq!(
        ledger.recommend_deletion(campaign_id, Role::Volunteer, "second", vec![]),
        Err(LedgerError::DeletionAlreadyOpen(campaign_id))
    );

    ledger.submit_deletion_review(item, review("agree")).unwrap();
    assert_eq!(
        ledger.recommend_deletion(campaign_id, Role::Admin, "third", vec![]),
        Err(LedgerError::DeletionAlreadyOpen(campaign_id))
    );
    assert_all_ledger_invariants(&ledger);
}

#[test]
fn test_deletion_preconditions() {
    let mut ledger = setup();
    let campaign_id = live_campaign(&mut ledger, "Solar Lamps");

    assert_eq!(
        ledger.recommend_deletion(campaign_id, Role::Ngo, "   ", vec![]),
        Err(LedgerError::MissingReason)
    );
    assert_eq!(
        ledger.recommend_deletion(404, Role::Ngo, "gone", vec![]),
        Err(LedgerError::CampaignNotFound(404))
    );

    let pending = ledger
        .submit_campaign(CampaignProposal {
            title: "Not yet live".to_string(),
            location: String::new(),
            organizer: "Org".to_string(),
            description: String::new(),
            image_url: String::new(),
            goal: 100,
            milestones: vec![MilestoneProposal {
                title: "All".to_string(),
                target: 100,
            }],
        })
        .unwrap();
    assert!(matches!(
        ledger.recommend_deletion(pending.campaign_id, Role::Admin, "spam", vec![]),
        Err(LedgerError::InvalidStatus { .. })
    ));

    let item = ledger
        .recommend_deletion(campaign_id, Role::Ngo, "closing", vec![])
        .unwrap();
    assert_eq!(
        ledger.submit_deletion_review(item, review("")),
        Err(LedgerError::MissingNote)
    );
    assert_eq!(
        ledger.approve_deletion(item),
        Err(LedgerError::WorkItemNotFound(item))
    );
}

#[test]
fn test_approved_deletion_purges_open_work_items() {
    let mut ledger = setup();
    let campaign_id = live_campaign(&mut ledger, "Water Tanks");
    let other_id = live_campaign(&mut ledger, "Bridge Repair");
    ledger
        .donate(campaign_id, Donation::new(400, "0xW", DonationMethod::Crypto))
        .unwrap();
    let milestone_id = ledger.campaign(campaign_id).unwrap().milestones[0].id;
    let release = ledger
        .request_milestone_release(campaign_id, milestone_id)
        .unwrap();
    assert_eq!(
        ledger
            .campaign(campaign_id)
            .unwrap()
            .milestone(milestone_id)
            .unwrap()
            .status,
        MilestoneStatus::PendingVolunteerVerification
    );
    let other_item = ledger
        .recommend_deletion(other_id, Role::Ngo, "unrelated", vec![])
        .unwrap();

    let item = ledger
        .recommend_deletion(campaign_id, Role::Volunteer, "Fraud", evidence())
        .unwrap();
    ledger.approve_deletion(item).unwrap();

    assert!(!ledger.volunteer_queue().contains(release));
    assert!(ledger.volunteer_queue().contains(other_item));
    assert!(ledger
        .volunteer_queue()
        .iter()
        .chain(ledger.admin_queue().iter())
        .all(|i| i.campaign_id != campaign_id));
    assert!(ledger.campaign(other_id).is_ok());

    // Notifications that referenced the deleted campaign survive.
    assert!(ledger
        .notifications(Role::Ngo)
        .iter()
        .any(|n| n.message.contains("Water Tanks") && n.message.contains("₱400")));
    assert_all_ledger_invariants(&ledger);
}
