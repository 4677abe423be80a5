//! Demo data loaded at startup.
//!
//! Every campaign is created through the ledger's own transitions, so the
//! seeded state obeys the same rules as anything created over HTTP.

use campaign_ledger::{
    CampaignId, CampaignLedger, CampaignProposal, Donation, DonationMethod, Evidence,
    MilestoneProposal, Result, ReviewSubmission, Role,
};
use tracing::info;

fn proposal(
    title: &str,
    location: &str,
    organizer: &str,
    description: &str,
    milestones: &[(&str, u64)],
) -> CampaignProposal {
    CampaignProposal {
        title: title.to_string(),
        location: location.to_string(),
        organizer: organizer.to_string(),
        description: description.to_string(),
        image_url: String::new(),
        goal: milestones.iter().map(|(_, target)| target).sum(),
        milestones: milestones
            .iter()
            .map(|(title, target)| MilestoneProposal {
                title: title.to_string(),
                target: *target,
            })
            .collect(),
    }
}

fn review(volunteer: &str, note: &str) -> ReviewSubmission {
    ReviewSubmission {
        volunteer: volunteer.to_string(),
        note: note.to_string(),
        evidence: vec![Evidence::link(
            "field photos",
            "https://photos.example.org/field-visit",
        )],
    }
}

fn approved(ledger: &mut CampaignLedger, proposal: CampaignProposal) -> Result<CampaignId> {
    let submitted = ledger.submit_campaign(proposal)?;
    ledger.verify_submission(
        submitted.item_id,
        review("Maria Santos", "Organisation and site verified."),
    )?;
    ledger.approve_campaign(submitted.item_id)?;
    Ok(submitted.campaign_id)
}

fn release_next(ledger: &mut CampaignLedger, campaign_id: CampaignId) -> Result<()> {
    let Some(milestone_id) = ledger.next_releasable(campaign_id)?.map(|m| m.id) else {
        return Ok(());
    };
    let item = ledger.request_milestone_release(campaign_id, milestone_id)?;
    ledger.submit_milestone_report(item, review("Juan dela Cruz", "Deliverables confirmed on site."))?;
    ledger.approve_milestone_release(item)?;
    Ok(())
}

/// Populate `ledger` with campaigns spread across the lifecycle. Returns how
/// many campaigns were created.
pub fn seed_demo(ledger: &mut CampaignLedger) -> Result<usize> {
    // Live, first milestone released, second waiting for funds.
    let water = approved(
        ledger,
        proposal(
            "Clean Water for Barangay San Roque",
            "Quezon City",
            "Water for All Foundation",
            "Two deep wells with filtration for 400 households.",
            &[("Drill first well", 120_000), ("Drill second well", 130_000)],
        ),
    )?;
    ledger.donate(water, Donation::new(100_000, "0x7a3f9c21", DonationMethod::Crypto))?;
    ledger.donate(water, Donation::new(25_000, "0x51be0d44", DonationMethod::Bank))?;
    ledger.donate(water, Donation::anonymous(5_000, DonationMethod::Qr))?;
    release_next(ledger, water)?;

    // Live with a release under volunteer verification.
    let school = approved(
        ledger,
        proposal(
            "School Supplies for Tondo",
            "Manila",
            "Bright Futures PH",
            "Notebooks, bags and uniforms for 600 pupils.",
            &[("First batch", 40_000), ("Second batch", 60_000)],
        ),
    )?;
    ledger.donate(school, Donation::new(45_000, "0x7a3f9c21", DonationMethod::Qr))?;
    if let Some(milestone_id) = ledger.next_releasable(school)?.map(|m| m.id) {
        ledger.request_milestone_release(school, milestone_id)?;
    }

    // Completed end to end.
    let mangroves = approved(
        ledger,
        proposal(
            "Mangrove Reforestation in Bohol",
            "Bohol",
            "Coastal Green Alliance",
            "Replanting 10 hectares of mangrove along the coast.",
            &[("Seedlings and nursery", 30_000)],
        ),
    )?;
    ledger.donate(mangroves, Donation::new(30_000, "0x9c04aa17", DonationMethod::Bank))?;
    release_next(ledger, mangroves)?;
    let report = ledger.submit_final_report(
        mangroves,
        "All 10 hectares were replanted with a 92% survival rate.",
        vec![Evidence::file("final-report.pdf", "https://files.example.org/final-report.pdf")],
    )?;
    ledger.verify_final_report(report, review("Ana Lim", "Visited the planting site."))?;
    ledger.approve_final_report(report)?;

    // Live, flagged by a volunteer for deletion.
    let kitchen = approved(
        ledger,
        proposal(
            "Community Kitchen in Payatas",
            "Quezon City",
            "Hapag Kusina",
            "Daily meals for 150 children.",
            &[("Kitchen equipment", 50_000)],
        ),
    )?;
    ledger.donate(kitchen, Donation::new(2_500, "0x51be0d44", DonationMethod::Crypto))?;
    ledger.recommend_deletion(
        kitchen,
        Role::Volunteer,
        "Kitchen address could not be located.",
        Vec::new(),
    )?;

    // Still in review.
    let shelters = ledger.submit_campaign(proposal(
        "Typhoon Shelter Kits",
        "Catanduanes",
        "Bayanihan Relief",
        "Tarpaulins and repair kits for 300 families.",
        &[("Procure kits", 75_000)],
    ))?;
    let clinic = ledger.submit_campaign(proposal(
        "Rural Health Clinic Upgrade",
        "Samar",
        "Kalusugan Para sa Lahat",
        "Solar power and a cold chain for vaccines.",
        &[("Solar array", 90_000), ("Vaccine refrigerator", 35_000)],
    ))?;
    ledger.verify_submission(clinic.item_id, review("Leo Garcia", "Permits on file."))?;

    let created = ledger.campaigns().count();
    info!(
        "Seeded {created} demo campaigns (pending submission {}, awaiting admin {})",
        shelters.campaign_id, clinic.campaign_id
    );
    Ok(created)
}
