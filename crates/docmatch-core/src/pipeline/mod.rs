//! Extraction pipeline orchestrator.
//!
//! State machine per attachment, terminal at the first unmet
//! precondition:
//!
//! ```text
//! RECEIVED -> IS_PDF? -> DECODED? -> DATES_FOUND? -> VALID_DATE?
//!          -> CANDIDATES_FOUND? -> NAME_MATCHED? -> {0..N MATCHED}
//! ```
//!
//! Failing a gate emits exactly one outcome capturing everything computed
//! so far; succeeding the final gate emits one outcome per matched
//! population record. Every attachment yields at least one record and no
//! failure escapes per-attachment processing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{DocmatchError, ResolverError, Result};
use crate::extract::{
    InstituteMatcher, earliest_valid_date, find_amounts, find_datestrings, flatten_lines,
    match_candidates, normalize_whitespace, replace_months,
};
use crate::models::{Attachment, DocmatchConfig, ExtractionOutcome, Message, PopulationRecord, TerminalStage};
use crate::pdf::{DocumentDecoder, PdfTextDecoder};
use crate::population::CandidateResolver;

/// Extraction pipeline over messages and attachments.
///
/// Holds no mutable state; per-attachment runs are independent and safe
/// to execute concurrently.
pub struct Pipeline<R> {
    decoder: Arc<dyn DocumentDecoder>,
    institutes: Arc<InstituteMatcher>,
    resolver: Arc<R>,
    jobs: usize,
    resolver_timeout: Option<Duration>,
}

impl<R> Pipeline<R>
where
    R: CandidateResolver + Send + Sync + 'static,
{
    /// Build a pipeline from an explicit configuration and a candidate
    /// resolver. Invalid institute patterns are rejected here rather than
    /// skipped at match time.
    pub fn new(config: &DocmatchConfig, resolver: R) -> Result<Self> {
        let institutes = InstituteMatcher::new(&config.parser.institutes)
            .map_err(|e| DocmatchError::Config(format!("invalid institute pattern: {e}")))?;

        Ok(Self {
            decoder: Arc::new(PdfTextDecoder::new(config.parser.min_text_length)),
            institutes: Arc::new(institutes),
            resolver: Arc::new(resolver),
            jobs: config.pipeline.jobs.max(1),
            resolver_timeout: config.pipeline.resolver_timeout_ms.map(Duration::from_millis),
        })
    }

    /// Replace the document decoder (alternative formats, tests).
    pub fn with_decoder(mut self, decoder: impl DocumentDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Run the per-attachment state machine and return its outcomes.
    pub async fn process_attachment(
        &self,
        message: &Message,
        attachment: &Attachment,
    ) -> Vec<ExtractionOutcome> {
        let mut outcome = ExtractionOutcome::for_attachment(message, attachment);

        if !outcome.is_pdf {
            return vec![outcome];
        }

        // Decoding is CPU-bound; keep it off the async workers.
        let decoder = Arc::clone(&self.decoder);
        let bytes = attachment.content.clone();
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(&bytes))
            .await
            .ok()
            .flatten();

        let Some(raw_text) = decoded else {
            outcome.stage = TerminalStage::NotParsed;
            return vec![outcome];
        };
        outcome.is_parsed = true;

        let text = normalize_whitespace(&raw_text);
        outcome.institutes = self
            .institutes
            .find(&flatten_lines(&text))
            .into_iter()
            .collect();
        outcome.amounts = find_amounts(&text).into_iter().collect();

        // Month substitution happens on a separate copy: surnames may
        // embed month abbreviations ("Jansen") and must stay intact for
        // the name search below.
        let dated = replace_months(&text);
        let datestrings = find_datestrings(&dated);
        outcome.date_candidates_found = datestrings.len();
        if datestrings.is_empty() {
            outcome.stage = TerminalStage::NoDates;
            return vec![outcome];
        }

        let Some(search_date) = earliest_valid_date(&datestrings) else {
            outcome.stage = TerminalStage::NoValidDate;
            return vec![outcome];
        };
        outcome.search_date = Some(search_date);

        let candidates = match self.lookup(search_date).await {
            Ok(candidates) => candidates,
            Err(err) => {
                // Fail open: one store outage must not stall the batch.
                warn!(%search_date, error = %err, "resolver lookup failed, treating as no candidates");
                outcome.resolver_error = true;
                Vec::new()
            }
        };
        outcome.has_candidates = !candidates.is_empty();
        if candidates.is_empty() {
            outcome.stage = TerminalStage::NoCandidates;
            return vec![outcome];
        }

        let matched = match_candidates(&candidates, &text);
        if matched.is_empty() {
            outcome.stage = TerminalStage::NoNameMatch;
            return vec![outcome];
        }

        debug!(
            attachment = %attachment.name,
            matches = matched.len(),
            "surname match fan-out"
        );
        let match_count = matched.len();
        matched
            .into_iter()
            .enumerate()
            .map(|(match_index, record)| outcome.with_student(record, match_index, match_count))
            .collect()
    }

    /// Process every attachment of a message in arrival order. A message
    /// without attachments yields exactly one outcome recording that
    /// fact.
    pub async fn process_message(&self, message: &Message) -> Vec<ExtractionOutcome> {
        if message.attachments.is_empty() {
            return vec![ExtractionOutcome::for_message(message)];
        }

        let mut outcomes = Vec::new();
        for attachment in &message.attachments {
            outcomes.extend(self.process_attachment(message, attachment).await);
        }
        outcomes
    }

    /// Process a batch of messages with bounded concurrency.
    ///
    /// Output order stays stable (message arrival order, then attachment
    /// order within a message) regardless of completion order: results
    /// are collected per spawned task and concatenated in submission
    /// order.
    pub async fn process_batch(self: Arc<Self>, messages: Vec<Message>) -> Vec<ExtractionOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let mut handles = Vec::with_capacity(messages.len());

        for message in messages {
            let pipeline = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                // The semaphore is never closed; a failed acquire only
                // means we run unthrottled.
                let _permit = semaphore.acquire_owned().await.ok();
                pipeline.process_message(&message).await
            }));
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(message_outcomes) => outcomes.extend(message_outcomes),
                Err(err) => warn!(error = %err, "message task aborted"),
            }
        }
        outcomes
    }

    async fn lookup(&self, search_date: chrono::NaiveDate) -> std::result::Result<Vec<PopulationRecord>, ResolverError> {
        let lookup = self.resolver.lookup_by_birth_date(search_date);
        match self.resolver_timeout {
            Some(limit) => tokio::time::timeout(limit, lookup)
                .await
                .map_err(|_| ResolverError::Timeout)?,
            None => lookup.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::population::tests::record;
    use chrono::{NaiveDate, Utc};
    use std::collections::HashMap;
    use std::future::Future;

    /// Decoder returning a fixed text, standing in for the PDF text
    /// layer.
    struct StaticDecoder(Option<String>);

    impl DocumentDecoder for StaticDecoder {
        fn decode(&self, _bytes: &[u8]) -> Option<String> {
            self.0.clone()
        }
    }

    /// Resolver that never answers within any timeout.
    struct StalledResolver;

    impl CandidateResolver for StalledResolver {
        fn lookup_by_birth_date(
            &self,
            _birth_date: NaiveDate,
        ) -> impl Future<Output = std::result::Result<Vec<PopulationRecord>, ResolverError>> + Send
        {
            async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }

    /// Resolver whose store is down.
    struct FailingResolver;

    impl CandidateResolver for FailingResolver {
        fn lookup_by_birth_date(
            &self,
            _birth_date: NaiveDate,
        ) -> impl Future<Output = std::result::Result<Vec<PopulationRecord>, ResolverError>> + Send
        {
            async { Err(ResolverError::Unavailable("connection refused".to_string())) }
        }
    }

    fn birth(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn message(id: &str, attachments: Vec<Attachment>) -> Message {
        Message {
            id: id.to_string(),
            folder_id: Some("to-process".to_string()),
            sender: "student@example.org".to_string(),
            subject: "bewijs collegegeld".to_string(),
            received_at: Utc::now(),
            is_read: false,
            flagged: false,
            attachments,
        }
    }

    fn snapshot(records: Vec<PopulationRecord>) -> crate::population::PopulationSnapshot {
        crate::population::PopulationSnapshot::new(records, &HashMap::new())
    }

    fn config_with(institutes: &[&str]) -> DocmatchConfig {
        let mut config = DocmatchConfig::default();
        config.parser.institutes = institutes.iter().map(|s| s.to_string()).collect();
        config
    }

    const SCAN_TEXT: &str =
        "Bewijs  betaald collegegeld  UU\ngeboren 01 januari 1999\nnaam: Jansen\nbedrag € 450,00\ndatum aanvraag 15-06-2020\n";

    #[tokio::test]
    async fn test_end_to_end_fan_out() {
        let records = vec![
            record("s1", "100", "Jansen", birth(1999, 1, 1)),
            record("s2", "200", "Jansen", birth(1999, 1, 1)),
        ];
        let pipeline = Pipeline::new(&config_with(&["UU"]), snapshot(records))
            .unwrap()
            .with_decoder(StaticDecoder(Some(SCAN_TEXT.to_string())));

        let msg = message("m1", vec![Attachment::new("a1", "scan.pdf", Vec::new())]);
        let outcomes = pipeline.process_message(&msg).await;

        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            assert_eq!(outcome.stage, TerminalStage::Matched);
            assert!(outcome.is_pdf && outcome.is_parsed);
            assert!(outcome.found_student);
            assert_eq!(outcome.match_count, 2);
            assert_eq!(outcome.search_date, Some(birth(1999, 1, 1)));
            assert!(outcome.amounts.contains("€ 450,00"));
            assert!(outcome.institutes.contains("UU"));
        }
        let students: Vec<&str> = outcomes
            .iter()
            .map(|o| o.student.as_ref().unwrap().student_number.as_str())
            .collect();
        assert_eq!(students, vec!["100", "200"]);
        let indices: Vec<Option<usize>> = outcomes.iter().map(|o| o.match_index).collect();
        assert_eq!(indices, vec![Some(0), Some(1)]);
    }

    #[tokio::test]
    async fn test_non_pdf_stops_at_first_gate() {
        let pipeline = Pipeline::new(&config_with(&[]), snapshot(Vec::new()))
            .unwrap()
            .with_decoder(StaticDecoder(Some(SCAN_TEXT.to_string())));

        let msg = message("m1", vec![Attachment::new("a1", "letter.docx", Vec::new())]);
        let outcomes = pipeline.process_message(&msg).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].stage, TerminalStage::NotPdf);
        assert!(!outcomes[0].is_pdf);
        assert!(!outcomes[0].is_parsed);
        assert!(outcomes[0].amounts.is_empty());
    }

    #[tokio::test]
    async fn test_decode_failure_is_recorded() {
        let pipeline = Pipeline::new(&config_with(&[]), snapshot(Vec::new()))
            .unwrap()
            .with_decoder(StaticDecoder(None));

        let msg = message("m1", vec![Attachment::new("a1", "scan.pdf", Vec::new())]);
        let outcomes = pipeline.process_message(&msg).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].stage, TerminalStage::NotParsed);
        assert!(outcomes[0].is_pdf);
        assert!(!outcomes[0].is_parsed);
    }

    #[tokio::test]
    async fn test_no_dates_halts_before_lookup() {
        let pipeline = Pipeline::new(&config_with(&[]), snapshot(Vec::new()))
            .unwrap()
            .with_decoder(StaticDecoder(Some(
                "bewijs zonder datum, bedrag € 120 voldaan".to_string(),
            )));

        let msg = message("m1", vec![Attachment::new("a1", "scan.pdf", Vec::new())]);
        let outcomes = pipeline.process_message(&msg).await;

        assert_eq!(outcomes[0].stage, TerminalStage::NoDates);
        assert_eq!(outcomes[0].date_candidates_found, 0);
        assert_eq!(outcomes[0].search_date, None);
        assert!(outcomes[0].amounts.contains("€ 120"));
    }

    #[tokio::test]
    async fn test_invalid_dates_only() {
        let pipeline = Pipeline::new(&config_with(&[]), snapshot(Vec::new()))
            .unwrap()
            .with_decoder(StaticDecoder(Some("geboren 31-02-2020".to_string())));

        let msg = message("m1", vec![Attachment::new("a1", "scan.pdf", Vec::new())]);
        let outcomes = pipeline.process_message(&msg).await;

        assert_eq!(outcomes[0].stage, TerminalStage::NoValidDate);
        assert_eq!(outcomes[0].date_candidates_found, 1);
        assert_eq!(outcomes[0].search_date, None);
    }

    #[tokio::test]
    async fn test_no_candidates_on_birth_date() {
        let records = vec![record("s1", "100", "Jansen", birth(1980, 5, 5))];
        let pipeline = Pipeline::new(&config_with(&[]), snapshot(records))
            .unwrap()
            .with_decoder(StaticDecoder(Some(SCAN_TEXT.to_string())));

        let msg = message("m1", vec![Attachment::new("a1", "scan.pdf", Vec::new())]);
        let outcomes = pipeline.process_message(&msg).await;

        assert_eq!(outcomes[0].stage, TerminalStage::NoCandidates);
        assert!(!outcomes[0].has_candidates);
        assert!(!outcomes[0].resolver_error);
    }

    #[tokio::test]
    async fn test_candidates_without_name_match() {
        let records = vec![record("s1", "100", "Pietersen", birth(1999, 1, 1))];
        let pipeline = Pipeline::new(&config_with(&[]), snapshot(records))
            .unwrap()
            .with_decoder(StaticDecoder(Some(SCAN_TEXT.to_string())));

        let msg = message("m1", vec![Attachment::new("a1", "scan.pdf", Vec::new())]);
        let outcomes = pipeline.process_message(&msg).await;

        assert_eq!(outcomes[0].stage, TerminalStage::NoNameMatch);
        assert!(outcomes[0].has_candidates);
        assert!(!outcomes[0].found_student);
        assert_eq!(outcomes[0].match_count, 0);
    }

    #[tokio::test]
    async fn test_message_without_attachments_still_records() {
        let pipeline = Pipeline::new(&config_with(&[]), snapshot(Vec::new())).unwrap();

        let msg = message("m1", Vec::new());
        let outcomes = pipeline.process_message(&msg).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].stage, TerminalStage::NoAttachments);
        assert!(!outcomes[0].has_attachments);
    }

    #[tokio::test]
    async fn test_resolver_timeout_fails_open() {
        let mut config = config_with(&[]);
        config.pipeline.resolver_timeout_ms = Some(50);

        let pipeline = Pipeline::new(&config, StalledResolver)
            .unwrap()
            .with_decoder(StaticDecoder(Some(SCAN_TEXT.to_string())));

        let msg = message("m1", vec![Attachment::new("a1", "scan.pdf", Vec::new())]);
        let outcomes = pipeline.process_message(&msg).await;

        assert_eq!(outcomes[0].stage, TerminalStage::NoCandidates);
        assert!(outcomes[0].resolver_error);
        assert!(!outcomes[0].has_candidates);
    }

    #[tokio::test]
    async fn test_resolver_failure_fails_open() {
        let pipeline = Pipeline::new(&config_with(&[]), FailingResolver)
            .unwrap()
            .with_decoder(StaticDecoder(Some(SCAN_TEXT.to_string())));

        let msg = message("m1", vec![Attachment::new("a1", "scan.pdf", Vec::new())]);
        let outcomes = pipeline.process_message(&msg).await;

        assert_eq!(outcomes[0].stage, TerminalStage::NoCandidates);
        assert!(outcomes[0].resolver_error);
    }

    #[tokio::test]
    async fn test_batch_order_and_completeness() {
        let records = vec![record("s1", "100", "Jansen", birth(1999, 1, 1))];
        let pipeline = Arc::new(
            Pipeline::new(&config_with(&[]), snapshot(records))
                .unwrap()
                .with_decoder(StaticDecoder(Some(SCAN_TEXT.to_string()))),
        );

        let messages = vec![
            message("m1", Vec::new()),
            message(
                "m2",
                vec![
                    Attachment::new("a1", "letter.docx", Vec::new()),
                    Attachment::new("a2", "scan.pdf", Vec::new()),
                ],
            ),
            message("m3", vec![Attachment::new("a3", "scan.pdf", Vec::new())]),
        ];
        let attachment_count: usize = messages.iter().map(|m| m.attachments.len()).sum();

        let outcomes = pipeline.process_batch(messages).await;

        // Completeness: >= one record per attachment, plus the empty
        // message's record.
        assert!(outcomes.len() >= attachment_count + 1);
        let message_order: Vec<&str> = outcomes.iter().map(|o| o.message_id.as_str()).collect();
        assert_eq!(message_order, vec!["m1", "m2", "m2", "m3"]);

        let pre_match = outcomes.iter().filter(|o| o.stage != TerminalStage::Matched).count();
        let fanned_out = outcomes.iter().filter(|o| o.stage == TerminalStage::Matched).count();
        assert_eq!(pre_match + fanned_out, outcomes.len());
        assert_eq!(fanned_out, 2);
    }
}
