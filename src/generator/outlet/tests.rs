#[cfg(test)]
mod tests {
    use crate::generator::outlet::{DiskOutlet, Outlet, render_report, slugify};
    use crate::generator::research::types::ReportData;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample_report() -> ReportData {
        ReportData {
            short_summary: "Plants turn light into chemical energy.".to_string(),
            markdown_report: "# Photosynthesis\n\nDetails.\n".to_string(),
            follow_up_questions: vec![
                "How does C4 photosynthesis differ?".to_string(),
                "What limits the rate?".to_string(),
            ],
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("What is photosynthesis?"), "what-is-photosynthesis");
        assert_eq!(slugify("  AI  in   healthcare!! "), "ai-in-healthcare");
        assert_eq!(slugify("???"), "report");
        assert_eq!(slugify(""), "report");
        assert!(slugify(&"word ".repeat(40)).chars().count() <= 48);
    }

    #[test]
    fn test_file_name_uses_timestamp_and_slug() {
        let timestamp = chrono::Local
            .with_ymd_and_hms(2026, 3, 1, 9, 5, 7)
            .single()
            .unwrap();
        assert_eq!(
            DiskOutlet::file_name("Rust async runtimes", &timestamp),
            "20260301-090507-rust-async-runtimes.md"
        );
    }

    #[test]
    fn test_render_report_sections() {
        let doc = render_report("What is photosynthesis?", &sample_report());

        assert!(doc.starts_with("<!-- query: What is photosynthesis? -->"));
        assert!(doc.contains("# Photosynthesis\n\nDetails."));
        assert!(doc.contains("## Summary\n\nPlants turn light into chemical energy.\n"));
        assert!(doc.contains("- How does C4 photosynthesis differ?\n- What limits the rate?\n"));
    }

    #[test]
    fn test_render_report_without_follow_ups() {
        let mut report = sample_report();
        report.follow_up_questions.clear();
        let doc = render_report("q", &report);
        assert!(!doc.contains("## Follow-up Questions"));
    }

    #[tokio::test]
    async fn test_disk_outlet_writes_report() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("reports");
        let outlet = DiskOutlet::new(&output_dir);

        let path = outlet
            .save("What is photosynthesis?", &sample_report())
            .await
            .unwrap();

        assert!(path.starts_with(&output_dir));
        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.ends_with("-what-is-photosynthesis.md"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# Photosynthesis"));
    }

    #[tokio::test]
    async fn test_disk_outlet_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let outlet = DiskOutlet::new(temp_dir.path());

        let first = outlet.save("same query", &sample_report()).await.unwrap();
        let second = outlet.save("same query", &sample_report()).await.unwrap();

        assert_ne!(first, second);
        assert!(first.exists());
        assert!(second.exists());
    }
}
