use intellibot::models::candidate_table::CandidateTable;
use intellibot::models::chat_turn::ChatTurn;
use intellibot::services::export_service::ExportService;
use intellibot::services::history_service::HistoryService;
use serde_json::json;

#[tokio::test]
async fn saved_sessions_get_increasing_serials() {
    let dir = tempfile::tempdir().unwrap();
    let history = HistoryService::new(dir.path().join("logs"));
    let turns = vec![
        ChatTurn::new("Schedule Asha tomorrow", "Which time works?"),
        ChatTurn::status("Meeting scheduled successfully."),
    ];

    let first = history.save(&turns).await.unwrap();
    let second = history.save(&turns).await.unwrap();

    assert!(first.ends_with("all_chat_history_sr_1.txt"));
    assert!(second.ends_with("all_chat_history_sr_2.txt"));

    let content = tokio::fs::read_to_string(&second).await.unwrap();
    assert!(content.starts_with("Serial Number: 2\n\n"));
    assert!(content.contains("User: Schedule Asha tomorrow\nBot: Which time works?\n\n"));
    assert!(content.contains("User: \nBot: Meeting scheduled successfully.\n\n"));
}

#[tokio::test]
async fn extracted_table_exports_to_xlsx_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("candidates.xlsx");
    let table = CandidateTable::from_json(&json!({
        "candidates": [
            {"Name": "Asha", "Key Skill": ["Rust", "SQL"], "Job Profile": "Data Engineer"},
            {"Name": "Ben", "Notice Period": "30 days"}
        ]
    }))
    .unwrap();

    ExportService::write_candidate_table_xlsx(&table, &out).await.unwrap();

    let bytes = tokio::fs::read(&out).await.unwrap();
    assert!(bytes.starts_with(b"PK"));
    assert_eq!(table.first_job_profile(), Some("Data Engineer"));
}
