//! Tests for automatic visit recording

#[cfg(test)]
mod tests {
    use crate::activity::VisitRecorder;
    use crate::navigation::Navigator;
    use crate::tests::framework::{Harness, trader};

    /// Drive `paths` through a recorder, then detach it and wait for every
    /// queued insert
    async fn record(harness: &Harness, initial: &str, paths: &[&str]) -> Vec<serde_json::Value> {
        let navigator = Navigator::new(initial);
        let recorder = VisitRecorder::attach(&navigator, harness.activity.clone());
        for path in paths {
            navigator.navigate(*path);
        }
        drop(recorder);
        harness.settled_rows().await
    }

    fn details(rows: &[serde_json::Value]) -> Vec<&str> {
        rows.iter().filter_map(|row| row["details"].as_str()).collect()
    }

    #[tokio::test]
    async fn test_navigation_records_one_visit_per_path() {
        let harness = Harness::new().signed_in();
        let rows = record(&harness, "/a", &["/b"]).await;

        let mut visited = details(&rows);
        visited.sort();
        assert_eq!(visited, vec!["Visited /a", "Visited /b"]);
        assert_eq!(visited.iter().filter(|d| d.contains("/b")).count(), 1);
        assert!(rows.iter().all(|row| row["type"] == "visit"));
        assert!(rows.iter().all(|row| row["user_id"] == "user-42"));
    }

    #[tokio::test]
    async fn test_repeated_navigation_is_not_a_new_visit() {
        let harness = Harness::new().signed_in();
        let rows = record(&harness, "/", &["/courses", "/courses", "/courses"]).await;

        let mut visited = details(&rows);
        visited.sort();
        assert_eq!(visited, vec!["Visited /", "Visited /courses"]);
    }

    #[tokio::test]
    async fn test_signed_out_navigation_records_nothing() {
        let harness = Harness::new();
        let rows = record(&harness, "/a", &["/b", "/c"]).await;

        assert!(rows.is_empty());
        assert_eq!(harness.store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_sign_in_after_navigating_does_not_claim_earlier_visits() {
        let harness = Harness::new();
        let navigator = Navigator::new("/");
        let recorder = VisitRecorder::attach(&navigator, harness.activity.clone());

        navigator.navigate("/login");
        harness.session.sign_in(trader());
        tokio::task::yield_now().await;
        navigator.navigate("/dashboard");
        drop(navigator);
        drop(recorder);

        let rows = harness.settled_rows().await;
        assert_eq!(details(&rows), vec!["Visited /dashboard"]);
        assert_eq!(rows[0]["user_id"], "user-42");
    }

    #[tokio::test]
    async fn test_sign_out_stops_recording_immediately() {
        let harness = Harness::new().signed_in();
        let navigator = Navigator::new("/");
        let _recorder = VisitRecorder::attach(&navigator, harness.activity.clone());

        harness.session.sign_out();
        navigator.navigate("/private");

        let rows = harness.settled_rows().await;
        assert_eq!(details(&rows), vec!["Visited /"]);
    }

    #[tokio::test]
    async fn test_recorder_stops_when_navigator_is_dropped() {
        let harness = Harness::new().signed_in();
        let navigator = Navigator::default();
        let recorder = VisitRecorder::attach(&navigator, harness.activity.clone());
        assert!(recorder.is_recording());

        drop(navigator);
        assert!(!recorder.is_recording());
        assert_eq!(harness.settled_rows().await.len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_recorder_records_nothing_more() {
        let harness = Harness::new().signed_in();
        let navigator = Navigator::new("/");
        drop(VisitRecorder::attach(&navigator, harness.activity.clone()));

        navigator.navigate("/after");
        assert_eq!(details(&harness.settled_rows().await), vec!["Visited /"]);
    }
}
