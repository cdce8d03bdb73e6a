use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use trend_core::summarizer::{DRAFT_ERROR, MISSING_KEY_NOTICE, NO_STORIES_NOTICE, SYSTEM_PROMPT};
use trend_core::{DraftSummarizer, Story, TextGenerator};

enum Reply {
    Text(&'static str),
    Nothing,
    Fail,
}

struct CountingGenerator {
    calls: AtomicUsize,
    last_user: Mutex<Option<String>>,
    reply: Reply,
}

impl CountingGenerator {
    fn new(reply: Reply) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_user: Mutex::new(None),
            reply,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for CountingGenerator {
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(system, SYSTEM_PROMPT);
        *self.last_user.lock().unwrap() = Some(user.to_string());
        match self.reply {
            Reply::Text(t) => Ok(Some(t.to_string())),
            Reply::Nothing => Ok(None),
            Reply::Fail => anyhow::bail!("upstream 500"),
        }
    }
}

fn one_story() -> Vec<Story> {
    vec![Story::new("A", "http://a", "2024-01-01")]
}

#[tokio::test]
async fn empty_batch_makes_no_remote_call() {
    let generator = CountingGenerator::new(Reply::Text("{}"));
    let draft = DraftSummarizer::new(Some(&generator)).summarize(&[]).await;

    assert!(draft.starts_with("🚀 AI and LLM Trends on X for "));
    assert!(draft.ends_with(NO_STORIES_NOTICE));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn missing_key_makes_no_remote_call() {
    let draft = DraftSummarizer::new(None).summarize(&one_story()).await;
    assert!(draft.ends_with(MISSING_KEY_NOTICE));
}

#[tokio::test]
async fn renders_one_bullet_per_item() {
    let generator = CountingGenerator::new(Reply::Text(
        r#"{"interestingTweetsOrStories":[{"description":"A summary","story_or_tweet_link":"http://a"}]}"#,
    ));
    let draft = DraftSummarizer::new(Some(&generator)).summarize(&one_story()).await;

    let (header, body) = draft.split_once("\n\n").unwrap();
    assert!(header.starts_with("🚀 AI and LLM Trends on X for "));
    assert_eq!(body, "• A summary\n  http://a");
    assert_eq!(body.matches('•').count(), 1);
    assert_eq!(generator.calls(), 1);

    let sent = generator.last_user.lock().unwrap().clone().unwrap();
    let sent: serde_json::Value = serde_json::from_str(&sent).unwrap();
    assert_eq!(sent["stories"][0]["headline"], "A");
    assert_eq!(sent["stories"][0]["date_posted"], "2024-01-01");
}

#[tokio::test]
async fn bullets_are_separated_by_blank_lines() {
    let generator = CountingGenerator::new(Reply::Text(
        r#"{"interestingTweetsOrStories":[
            {"description":"One","story_or_tweet_link":"http://1"},
            {"headline":"Two","link":"http://2"}
        ]}"#,
    ));
    let draft = DraftSummarizer::new(Some(&generator)).summarize(&one_story()).await;
    assert!(draft.ends_with("• One\n  http://1\n\n• Two\n  http://2"));
}

#[tokio::test]
async fn unusable_replies_degrade_to_notice() {
    for reply in [
        Reply::Nothing,
        Reply::Text("   "),
        Reply::Text("not json at all"),
        Reply::Text(r#"{"interestingTweetsOrStories":[]}"#),
    ] {
        let generator = CountingGenerator::new(reply);
        let draft = DraftSummarizer::new(Some(&generator)).summarize(&one_story()).await;
        assert!(draft.ends_with(NO_STORIES_NOTICE), "got: {draft}");
        assert_eq!(generator.calls(), 1);
    }
}

#[tokio::test]
async fn remote_failure_becomes_error_document() {
    let generator = CountingGenerator::new(Reply::Fail);
    let draft = DraftSummarizer::new(Some(&generator)).summarize(&one_story()).await;
    assert_eq!(draft, DRAFT_ERROR);
}
