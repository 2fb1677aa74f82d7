use chrono::{DateTime, TimeZone, Utc};

use post_cockpit::newsletter::{
    format_blocks_for_prompt, BlockPatch, MoveDirection, NewsletterIssue, DEFAULT_SECTION,
    SECTIONS, TITLE_OPTIONS,
};
use post_cockpit::CockpitError;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 15, 0, 0).unwrap()
}

fn add(issue: &mut NewsletterIssue, section: &str, label: &str) -> String {
    let id = issue.add_block(Some(section), now()).id.clone();
    issue
        .update_block(
            &id,
            BlockPatch {
                label: Some(label.to_string()),
                ..BlockPatch::default()
            },
        )
        .unwrap();
    id
}

fn labels(issue: &NewsletterIssue) -> Vec<&str> {
    issue.blocks.iter().map(|block| block.label.as_str()).collect()
}

#[test]
fn default_issue_has_every_section_empty() {
    let issue = NewsletterIssue::default();
    assert_eq!(issue.tone, "firm");
    assert_eq!(issue.length, "medium");
    assert_eq!(issue.outputs.len(), SECTIONS.len());
    assert!(issue.outputs.values().all(|text| text.is_empty()));
    assert_eq!(issue.compose_all(), "");
}

#[test]
fn unknown_sections_fall_back_to_democracy_watch() {
    let mut issue = NewsletterIssue::default();
    assert_eq!(issue.add_block(Some("gossip"), now()).section_id, DEFAULT_SECTION);
    assert_eq!(issue.add_block(None, now()).section_id, DEFAULT_SECTION);
    assert_eq!(issue.add_block(Some("community"), now()).section_id, "community");
    assert_eq!(issue.blocks.len(), 3);
}

#[test]
fn blocks_move_within_bounds() {
    let mut issue = NewsletterIssue::default();
    let a = add(&mut issue, "opening", "a");
    add(&mut issue, "opening", "b");
    let c = add(&mut issue, "opening", "c");

    issue.move_block(&c, MoveDirection::Up).unwrap();
    assert_eq!(labels(&issue), vec!["a", "c", "b"]);

    issue.move_block(&a, MoveDirection::Up).unwrap();
    assert_eq!(labels(&issue), vec!["a", "c", "b"]);

    issue.move_block(&a, MoveDirection::Down).unwrap();
    assert_eq!(labels(&issue), vec!["c", "a", "b"]);

    assert!(matches!(
        issue.move_block("block_missing", MoveDirection::Down),
        Err(CockpitError::BlockNotFound(_))
    ));
}

#[test]
fn deleting_blocks() {
    let mut issue = NewsletterIssue::default();
    let id = add(&mut issue, "community", "potluck");
    assert_eq!(issue.delete_block(&id).unwrap().label, "potluck");
    assert!(issue.blocks.is_empty());
    assert!(matches!(issue.delete_block(&id), Err(CockpitError::BlockNotFound(_))));
}

#[test]
fn generation_needs_an_issue_and_blocks() {
    let mut issue = NewsletterIssue::default();
    add(&mut issue, "opening", "hello");
    assert!(matches!(issue.section_jobs(), Err(CockpitError::Newsletter(_))));

    let mut issue = NewsletterIssue {
        issue: "School board vote".to_string(),
        ..NewsletterIssue::default()
    };
    assert!(matches!(issue.section_jobs(), Err(CockpitError::Newsletter(_))));

    add(&mut issue, "opening", "hello");
    assert_eq!(issue.section_jobs().unwrap().len(), 1);
}

#[test]
fn section_jobs_follow_catalog_order() {
    let mut issue = NewsletterIssue {
        issue: "School board vote".to_string(),
        tone: "urgent".to_string(),
        length: "short".to_string(),
        ..NewsletterIssue::default()
    };
    add(&mut issue, "closing_optional", "thanks");
    add(&mut issue, "opening", "welcome");
    add(&mut issue, "closing_optional", "see you");

    let jobs = issue.section_jobs().unwrap();
    let sections: Vec<&str> = jobs.iter().map(|job| job.section_id).collect();
    assert_eq!(sections, vec!["opening", "closing_optional"]);

    let closing = &jobs[1];
    assert!(closing.user.starts_with("Issue/Topic: School board vote\n"));
    assert!(closing.user.contains("Tone: urgent"));
    assert!(closing.user.contains("Length: short"));
    assert!(closing.user.contains("Section: Closing (Optional) (closing_optional)"));
    assert!(closing.user.contains("BLOCK 1:\nTitle: thanks"));
    assert!(closing.user.contains("BLOCK 2:\nTitle: see you"));
    assert!(closing.user.ends_with("Write the final section copy now."));
    assert!(closing.system.contains("plain text"));
}

#[test]
fn empty_block_fields_read_as_none() {
    let mut issue = NewsletterIssue::default();
    issue.add_block(Some("resources_optional"), now());
    let blocks: Vec<_> = issue.blocks.iter().collect();
    assert_eq!(
        format_blocks_for_prompt(&blocks),
        "BLOCK 1:\nTitle: (none)\nLinks: (none)\nNotes: (none)\n"
    );
}

#[test]
fn block_links_and_notes_keep_their_lines() {
    let mut issue = NewsletterIssue::default();
    let id = issue.add_block(Some("resources_optional"), now()).id.clone();
    issue
        .update_block(
            &id,
            BlockPatch {
                label: Some("Tenant help".to_string()),
                links: Some("https://a.org\nhttps://b.org".to_string()),
                notes: Some("Free clinic on Tuesdays".to_string()),
                ..BlockPatch::default()
            },
        )
        .unwrap();
    let blocks: Vec<_> = issue.blocks.iter().collect();
    assert_eq!(
        format_blocks_for_prompt(&blocks),
        "BLOCK 1:\nTitle: Tenant help\nLinks:\nhttps://a.org\nhttps://b.org\nNotes:\nFree clinic on Tuesdays\n"
    );
}

#[test]
fn titles_need_some_section_output() {
    let mut issue = NewsletterIssue {
        issue: "School board vote".to_string(),
        ..NewsletterIssue::default()
    };
    assert!(matches!(issue.title_prompt(), Err(CockpitError::Newsletter(_))));

    issue.set_output("opening", "```\nWe have a vote coming.\n```");
    assert_eq!(issue.outputs["opening"], "We have a vote coming.");

    let (_, user) = issue.title_prompt().unwrap();
    assert!(user.contains(&format!("generate exactly {} subject/title options", TITLE_OPTIONS)));
    assert!(user.ends_with("NEWSLETTER CONTENT:\nWe have a vote coming."));
}

#[test]
fn compose_all_joins_sections_in_order() {
    let mut issue = NewsletterIssue::default();
    issue.set_output("community", "Potluck Sunday.");
    issue.set_output("opening", "Big week.");
    issue.set_output("call_to_action", "   ");

    assert_eq!(
        issue.compose_all(),
        "Opening\nBig week.\n\n---\n\nCommunity\nPotluck Sunday."
    );
}
