use std::sync::Arc;

use chrono::Duration;

use crate::views::{
    aggregated_donors, analytics, explorer_feed, platform_donations, ExplorerEventKind,
    RECENT_DONATIONS,
};
use crate::{
    CampaignId, CampaignLedger, CampaignProposal, Donation, DonationMethod, Evidence, ManualClock,
    MilestoneProposal, ReviewSubmission, ANONYMOUS_DONOR,
};

fn setup() -> (Arc<ManualClock>, CampaignLedger) {
    let clock = Arc::new(ManualClock::epoch());
    let ledger = CampaignLedger::with_clock(clock.clone());
    (clock, ledger)
}

fn review() -> ReviewSubmission {
    ReviewSubmission {
        volunteer: "Leo Garcia".to_string(),
        note: "checked".to_string(),
        evidence: vec![Evidence::link("photo", "https://photos.example.org/2")],
    }
}

fn live_campaign(ledger: &mut CampaignLedger, title: &str, targets: &[u64]) -> CampaignId {
    let submitted = ledger
        .submit_campaign(CampaignProposal {
            title: title.to_string(),
            location: "Davao".to_string(),
            organizer: "Hope Org".to_string(),
            description: String::new(),
            image_url: String::new(),
            goal: targets.iter().sum(),
            milestones: targets
                .iter()
                .enumerate()
                .map(|(i, target)| MilestoneProposal {
                    title: format!("Step {}", i + 1),
                    target: *target,
                })
                .collect(),
        })
        .unwrap();
    ledger.verify_submission(submitted.item_id, review()).unwrap();
    ledger.approve_campaign(submitted.item_id).unwrap();
    submitted.campaign_id
}

fn release_next(ledger: &mut CampaignLedger, campaign_id: CampaignId) {
    let milestone_id = ledger.next_releasable(campaign_id).unwrap().unwrap().id;
    let item = ledger
        .request_milestone_release(campaign_id, milestone_id)
        .unwrap();
    ledger.submit_milestone_report(item, review()).unwrap();
    ledger.approve_milestone_release(item).unwrap();
}

#[test]
fn test_platform_donations_newest_first_across_campaigns() {
    let (clock, mut ledger) = setup();
    let a = live_campaign(&mut ledger, "Alpha", &[1_000]);
    let b = live_campaign(&mut ledger, "Beta", &[1_000]);

    ledger
        .donate(a, Donation::new(100, "0x1", DonationMethod::Crypto))
        .unwrap();
    clock.advance(Duration::hours(1));
    ledger
        .donate(b, Donation::new(200, "0x2", DonationMethod::Qr))
        .unwrap();
    clock.advance(Duration::hours(1));
    ledger
        .donate(a, Donation::new(300, "0x3", DonationMethod::Bank))
        .unwrap();

    let feed = platform_donations(&ledger);
    let amounts: Vec<_> = feed.iter().filter_map(|d| d.transaction.amount).collect();
    assert_eq!(amounts, vec![300, 200, 100]);
    assert_eq!(feed[1].campaign_title, "Beta");
    assert_eq!(feed[1].campaign_id, b);
}

#[test]
fn test_platform_donations_exclude_releases_and_approvals() {
    let (_clock, mut ledger) = setup();
    let a = live_campaign(&mut ledger, "Alpha", &[500]);
    ledger
        .donate(a, Donation::new(500, "0x1", DonationMethod::Crypto))
        .unwrap();
    release_next(&mut ledger, a);

    let feed = platform_donations(&ledger);
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].transaction.amount, Some(500));
}

#[test]
fn test_same_instant_donations_keep_a_stable_order() {
    let (_clock, mut ledger) = setup();
    let a = live_campaign(&mut ledger, "Alpha", &[1_000]);
    for amount in [10, 20, 30] {
        ledger
            .donate(a, Donation::new(amount, "0x1", DonationMethod::Crypto))
            .unwrap();
    }

    let amounts: Vec<_> = platform_donations(&ledger)
        .iter()
        .filter_map(|d| d.transaction.amount)
        .collect();
    assert_eq!(amounts, vec![30, 20, 10]);
}

#[test]
fn test_donors_grouped_and_ranked() {
    let (clock, mut ledger) = setup();
    let a = live_campaign(&mut ledger, "Alpha", &[5_000]);
    let b = live_campaign(&mut ledger, "Beta", &[5_000]);

    ledger
        .donate(a, Donation::new(100, "0xAAA", DonationMethod::Crypto))
        .unwrap();
    ledger
        .donate(b, Donation::new(250, "0xAAA", DonationMethod::Crypto))
        .unwrap();
    ledger
        .donate(a, Donation::new(300, "0xBBB", DonationMethod::Bank))
        .unwrap();
    ledger
        .donate(a, Donation::anonymous(50, DonationMethod::Qr))
        .unwrap();
    clock.advance(Duration::days(2));
    ledger
        .donate(b, Donation::anonymous(75, DonationMethod::Qr))
        .unwrap();

    let donors = aggregated_donors(&ledger);
    assert_eq!(donors.len(), 3);

    assert_eq!(donors[0].address, "0xAAA");
    assert_eq!(donors[0].total_donated, 350);
    assert_eq!(donors[0].donation_count, 2);
    assert_eq!(donors[1].address, "0xBBB");

    let anonymous = &donors[2];
    assert_eq!(anonymous.address, ANONYMOUS_DONOR);
    assert_eq!(anonymous.total_donated, 125);
    assert_eq!(anonymous.donation_count, 2);
    assert_eq!(anonymous.last_donation_at, ledger.now());
}

#[test]
fn test_views_are_pure() {
    let (_clock, mut ledger) = setup();
    let a = live_campaign(&mut ledger, "Alpha", &[400, 600]);
    ledger
        .donate(a, Donation::new(700, "0x1", DonationMethod::Crypto))
        .unwrap();
    release_next(&mut ledger, a);

    assert_eq!(platform_donations(&ledger), platform_donations(&ledger));
    assert_eq!(aggregated_donors(&ledger), aggregated_donors(&ledger));
    assert_eq!(analytics(&ledger), analytics(&ledger));
    assert_eq!(explorer_feed(&ledger), explorer_feed(&ledger));
}

#[test]
fn test_analytics_summary_counters() {
    let (_clock, mut ledger) = setup();
    let a = live_campaign(&mut ledger, "Alpha", &[400, 600]);
    let b = live_campaign(&mut ledger, "Beta", &[300]);
    ledger
        .donate(a, Donation::new(750_000, "0x1", DonationMethod::Crypto))
        .unwrap();
    ledger
        .donate(b, Donation::new(300, "0x2", DonationMethod::Bank))
        .unwrap();
    release_next(&mut ledger, a);
    release_next(&mut ledger, b);

    let data = analytics(&ledger);
    let summary = &data.summary;
    assert_eq!(summary.total_raised, 750_300);
    assert_eq!(summary.total_released, 700);
    assert_eq!(summary.verified_milestones, 2);
    // Beta moved on to its final report; only Alpha is live.
    assert_eq!(summary.active_campaigns, 1);
    assert_eq!(summary.completed_campaigns, 0);
    assert_eq!(summary.escrow_balance, 750_000 - 400);
    assert_eq!(summary.total_raised_eth, 5.002);
}

#[test]
fn test_monthly_series_sums_to_total_raised() {
    let (_clock, mut ledger) = setup();
    let a = live_campaign(&mut ledger, "Alpha", &[10_000]);
    ledger
        .donate(a, Donation::new(1_237, "0x1", DonationMethod::Crypto))
        .unwrap();

    let monthly = analytics(&ledger).monthly;
    assert_eq!(monthly.len(), 6);
    assert_eq!(monthly.iter().map(|p| p.amount).sum::<u64>(), 1_237);
    assert_eq!(monthly[0].amount, 1_237 * 8 / 100);
    assert_eq!(
        monthly.iter().map(|p| p.percent).collect::<Vec<_>>(),
        vec![8, 12, 15, 18, 22, 25]
    );
    // The clock sits on 1 January 2024, so the window starts in August.
    let labels: Vec<_> = monthly.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["Aug", "Sep", "Oct", "Nov", "Dec", "Jan"]);
}

#[test]
fn test_views_saturate_on_amounts_near_u64_max() {
    let (_clock, mut ledger) = setup();
    let a = live_campaign(&mut ledger, "Alpha", &[10_000]);
    let b = live_campaign(&mut ledger, "Beta", &[10_000]);
    let large = u64::MAX / 2 + 1;
    for id in [a, b] {
        ledger
            .donate(id, Donation::new(large, "0xA", DonationMethod::Crypto))
            .unwrap();
    }
    ledger
        .donate(a, Donation::anonymous(u64::MAX / 10, DonationMethod::Bank))
        .unwrap();

    let data = analytics(&ledger);
    assert_eq!(data.summary.total_raised, u64::MAX);
    assert_eq!(data.summary.escrow_balance, u64::MAX);
    assert_eq!(data.summary.total_released, 0);
    assert_eq!(
        data.monthly
            .iter()
            .map(|p| u128::from(p.amount))
            .sum::<u128>(),
        u128::from(u64::MAX)
    );
    assert_eq!(data.monthly[0].amount, (u128::from(u64::MAX) * 8 / 100) as u64);

    let crypto = data
        .methods
        .iter()
        .find(|m| m.method == DonationMethod::Crypto)
        .unwrap();
    assert_eq!(crypto.total, u64::MAX);
    assert_eq!(crypto.count, 2);
    assert_eq!(crypto.percent, 100.0);
    let bank = data
        .methods
        .iter()
        .find(|m| m.method == DonationMethod::Bank)
        .unwrap();
    assert_eq!(bank.total, u64::MAX / 10);

    let donors = aggregated_donors(&ledger);
    assert_eq!(donors[0].address, "0xA");
    assert_eq!(donors[0].total_donated, u64::MAX);
    assert_eq!(donors[0].donation_count, 2);
    assert_eq!(donors[1].address, ANONYMOUS_DONOR);
}

#[test]
fn test_method_breakdown_and_recent_donations() {
    let (clock, mut ledger) = setup();
    let a = live_campaign(&mut ledger, "Alpha", &[10_000]);
    for (amount, method) in [
        (500, DonationMethod::Crypto),
        (250, DonationMethod::Qr),
        (250, DonationMethod::Qr),
        (1_000, DonationMethod::Bank),
        (1_000, DonationMethod::Crypto),
        (2_000, DonationMethod::Bank),
    ] {
        clock.advance(Duration::minutes(10));
        ledger
            .donate(a, Donation::new(amount, "0x1", method))
            .unwrap();
    }

    let data = analytics(&ledger);
    let qr = data
        .methods
        .iter()
        .find(|m| m.method == DonationMethod::Qr)
        .unwrap();
    assert_eq!(qr.total, 500);
    assert_eq!(qr.count, 2);
    assert_eq!(qr.percent, 10.0);
    assert_eq!(qr.label, "QR Payment");
    assert_eq!(data.methods.len(), 3);

    assert_eq!(data.recent_donations.len(), RECENT_DONATIONS);
    let newest = &data.recent_donations[0];
    assert_eq!(newest.amount, 2_000);
    assert_eq!(newest.amount_display, "₱2,000");
    assert_eq!(newest.when, "Just now");
    assert_eq!(data.recent_donations[1].when, "10 minutes ago");
}

#[test]
fn test_analytics_on_empty_ledger() {
    let (_clock, ledger) = setup();
    let data = analytics(&ledger);
    assert_eq!(data.summary.total_raised, 0);
    assert_eq!(data.summary.total_raised_eth, 0.0);
    assert!(data.monthly.iter().all(|p| p.amount == 0));
    assert!(data.methods.iter().all(|m| m.percent == 0.0));
    assert!(data.recent_donations.is_empty());
}

#[test]
fn test_explorer_feed_lists_every_event_newest_first() {
    let (clock, mut ledger) = setup();
    let a = live_campaign(&mut ledger, "Alpha", &[500]);
    clock.advance(Duration::minutes(1));
    ledger
        .donate(a, Donation::new(500, "0xD", DonationMethod::Crypto))
        .unwrap();
    clock.advance(Duration::minutes(1));
    release_next(&mut ledger, a);

    let feed = explorer_feed(&ledger);
    let kinds: Vec<_> = feed.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ExplorerEventKind::FundsReleased,
            ExplorerEventKind::MilestoneVerified,
            ExplorerEventKind::Donation,
            ExplorerEventKind::CampaignApproved,
        ]
    );
    assert!(feed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

    let verified = &feed[1];
    assert_eq!(verified.actor.as_deref(), Some("Leo Garcia"));
    assert_eq!(verified.hash, feed[0].hash);
    assert_eq!(feed[2].actor.as_deref(), Some("0xD"));
}
