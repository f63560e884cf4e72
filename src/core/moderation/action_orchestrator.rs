// Action orchestrator - turns a verdict into observable actions.
//
// Decides between doing nothing, rebuking, and rebuking + muting, then carries it
// out through a platform-neutral chat client. Administrators are rebuked but
// never muted. Delivery failures are logged and never retried.

use super::moderation_models::{
    ConversationId, IncomingMessage, ModerationAction, ModerationConfig, ModerationVerdict,
};
use super::mute_scheduler::{MuteKey, MuteScheduler};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Conversation is not a group")]
    NotInGroup,
}

/// What the moderation core needs from a chat platform.
#[async_trait]
pub trait ChatClient: Send + Sync + 'static {
    /// Post `text` in the conversation, threaded to `reply_to` when given.
    async fn send_reply(
        &self,
        conversation: ConversationId,
        reply_to: Option<u64>,
        text: &str,
    ) -> Result<(), ChatError>;

    /// Whether the actor administers (or owns) the conversation.
    async fn is_admin(&self, conversation: ConversationId, actor_id: u64)
        -> Result<bool, ChatError>;

    /// Revoke the actor's ability to post in the conversation.
    async fn restrict(&self, conversation: ConversationId, actor_id: u64) -> Result<(), ChatError>;

    /// Restore the actor's ability to post in the conversation.
    async fn unrestrict(&self, conversation: ConversationId, actor_id: u64)
        -> Result<(), ChatError>;
}

/// Build the reply text for a message in the wrong language.
pub fn compose_rebuke(
    verdict: &ModerationVerdict,
    muted: bool,
    config: &ModerationConfig,
) -> String {
    let context = &verdict.context;
    let detected_name = context
        .translation
        .as_ref()
        .map(|t| t.detected_language_name.as_str())
        .unwrap_or("language");

    let mut message = format!(
        "Oi, I don't concur with this {}! We only use {} here.\n",
        detected_name, context.required_language_name
    );

    if muted {
        message.push_str(&format!(
            "You've been muted for {} seconds.\n",
            config.mute_timeout.as_secs()
        ));
    }

    if config.be_helpful {
        match &context.translation {
            Some(t) if t.has_meaningful_translation() => {
                message.push_str(&format!("BTW, we know you mean \"{}\"", t.translated_text));
            }
            _ => message.push_str("BTW, we've no idea what you tried to say."),
        }
    }

    message
}

/// Pick the action for a verdict. Pure; no I/O.
pub fn plan_action(
    verdict: &ModerationVerdict,
    actor_is_admin: bool,
    config: &ModerationConfig,
) -> ModerationAction {
    if !verdict.should_act {
        return ModerationAction::NoAction;
    }

    let mute = config.mute_people && !actor_is_admin;
    let message = compose_rebuke(verdict, mute, config);

    if mute {
        ModerationAction::RebukeAndMute {
            message,
            duration: config.mute_timeout,
        }
    } else {
        ModerationAction::Rebuke { message }
    }
}

pub struct ActionOrchestrator<C: ChatClient> {
    client: Arc<C>,
    config: ModerationConfig,
    mutes: MuteScheduler,
}

impl<C: ChatClient> ActionOrchestrator<C> {
    pub fn new(client: Arc<C>, config: ModerationConfig) -> Self {
        Self {
            client,
            config,
            mutes: MuteScheduler::new(),
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    #[allow(dead_code)]
    pub fn mutes(&self) -> &MuteScheduler {
        &self.mutes
    }

    /// Decide and carry out the action for one message.
    ///
    /// Returns the action that was decided, even if delivering it failed.
    pub async fn act(
        &self,
        message: &IncomingMessage,
        verdict: &ModerationVerdict,
    ) -> ModerationAction {
        if !verdict.should_act {
            return ModerationAction::NoAction;
        }

        // Admin status only matters when muting is on.
        let actor_is_admin = if self.config.mute_people {
            match self
                .client
                .is_admin(message.conversation, message.author_id)
                .await
            {
                Ok(is_admin) => is_admin,
                Err(e) => {
                    // Can't tell - don't mute.
                    tracing::warn!(
                        user_id = message.author_id,
                        "Failed to check admin status: {}",
                        e
                    );
                    true
                }
            }
        } else {
            false
        };

        let mut action = plan_action(verdict, actor_is_admin, &self.config);

        // The mute line is only true once the restriction is in place.
        if let ModerationAction::RebukeAndMute { duration, .. } = &action {
            if !self.mute(message, *duration).await {
                action = ModerationAction::Rebuke {
                    message: compose_rebuke(verdict, false, &self.config),
                };
            }
        }

        tracing::info!(
            user_id = message.author_id,
            user = %message.author_name,
            group_id = message.conversation.group_id,
            ?action,
            "Performing language enforcement action"
        );

        match &action {
            ModerationAction::NoAction => {}
            ModerationAction::Rebuke { message: text }
            | ModerationAction::RebukeAndMute { message: text, .. } => {
                self.reply(message, text).await;
            }
        }

        action
    }

    async fn reply(&self, message: &IncomingMessage, text: &str) {
        if let Err(e) = self
            .client
            .send_reply(message.conversation, Some(message.message_id), text)
            .await
        {
            tracing::warn!(
                group_id = message.conversation.group_id,
                "Failed to send rebuke: {}",
                e
            );
        }
    }

    /// Restrict the author and schedule the unmute. Returns whether the
    /// restriction was applied.
    async fn mute(&self, message: &IncomingMessage, duration: std::time::Duration) -> bool {
        let conversation = message.conversation;
        let actor_id = message.author_id;

        if let Err(e) = self.client.restrict(conversation, actor_id).await {
            tracing::error!(user_id = actor_id, "Failed to mute user: {}", e);
            return false;
        }

        tracing::info!(
            user_id = actor_id,
            user = %message.author_name,
            seconds = duration.as_secs(),
            "Muted user"
        );

        let client = Arc::clone(&self.client);
        let name = message.author_name.clone();
        self.mutes.schedule(
            MuteKey {
                conversation,
                actor_id,
            },
            duration,
            move || async move {
                match client.unrestrict(conversation, actor_id).await {
                    Ok(()) => tracing::info!(user_id = actor_id, user = %name, "Unmuted user"),
                    Err(e) => tracing::error!(user_id = actor_id, "Failed to unmute user: {}", e),
                }
            },
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{
        ExceptionEntry, ExceptionError, ExceptionStore, ModerationContext, ModerationService,
    };
    use crate::core::translation::{
        ProviderTranslation, Translation, TranslationError, TranslationProvider, TranslatorService,
    };
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Reply { reply_to: Option<u64>, text: String },
        Restrict(u64),
        Unrestrict(u64),
    }

    /// Records every platform call
    struct RecordingClient {
        admins: Vec<u64>,
        calls: Mutex<Vec<Call>>,
        fail_admin_lookup: bool,
        fail_replies: bool,
        fail_restrict: bool,
        fail_unrestrict: bool,
    }

    impl RecordingClient {
        fn new(admins: Vec<u64>) -> Self {
            Self {
                admins,
                calls: Mutex::new(Vec::new()),
                fail_admin_lookup: false,
                fail_replies: false,
                fail_restrict: false,
                fail_unrestrict: false,
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls().iter().filter(|c| pred(c)).count()
        }
    }

    #[async_trait]
    impl ChatClient for RecordingClient {
        async fn send_reply(
            &self,
            _conversation: ConversationId,
            reply_to: Option<u64>,
            text: &str,
        ) -> Result<(), ChatError> {
            if self.fail_replies {
                return Err(ChatError::Platform("missing access".to_string()));
            }
            self.calls.lock().unwrap().push(Call::Reply {
                reply_to,
                text: text.to_string(),
            });
            Ok(())
        }

        async fn is_admin(
            &self,
            _conversation: ConversationId,
            actor_id: u64,
        ) -> Result<bool, ChatError> {
            if self.fail_admin_lookup {
                return Err(ChatError::Platform("member not found".to_string()));
            }
            Ok(self.admins.contains(&actor_id))
        }

        async fn restrict(
            &self,
            _conversation: ConversationId,
            actor_id: u64,
        ) -> Result<(), ChatError> {
            if self.fail_restrict {
                return Err(ChatError::Platform("Missing Permissions".to_string()));
            }
            self.calls.lock().unwrap().push(Call::Restrict(actor_id));
            Ok(())
        }

        async fn unrestrict(
            &self,
            _conversation: ConversationId,
            actor_id: u64,
        ) -> Result<(), ChatError> {
            self.calls.lock().unwrap().push(Call::Unrestrict(actor_id));
            if self.fail_unrestrict {
                return Err(ChatError::Platform("Unknown Member".to_string()));
            }
            Ok(())
        }
    }

    const ADMIN: u64 = 1;
    const MEMBER: u64 = 2;

    fn config(be_helpful: bool, mute_people: bool) -> ModerationConfig {
        ModerationConfig {
            required_language: "en".to_string(),
            be_helpful,
            mute_people,
            mute_timeout: Duration::from_millis(30_000),
        }
    }

    fn message(author_id: u64, text: &str) -> IncomingMessage {
        IncomingMessage {
            conversation: ConversationId {
                group_id: 100,
                channel_id: 200,
            },
            message_id: 300,
            author_id,
            author_name: "someone".to_string(),
            text: text.to_string(),
        }
    }

    fn violation(translated: &str) -> ModerationVerdict {
        ModerationVerdict {
            should_act: true,
            context: ModerationContext {
                required_language_code: "en".to_string(),
                required_language_name: "English".to_string(),
                is_correct_language: false,
                translation: Some(Translation::new(
                    "oto tekst po polsku",
                    "pl",
                    "Polish",
                    translated,
                    0.95,
                )),
            },
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_no_action_when_verdict_is_clean() {
        let mut verdict = violation("here is text in Polish");
        verdict.should_act = false;
        assert_eq!(
            plan_action(&verdict, false, &config(true, true)),
            ModerationAction::NoAction
        );
    }

    #[test]
    fn test_rebuke_names_both_languages() {
        let action = plan_action(
            &violation("here is text in Polish"),
            false,
            &config(false, false),
        );
        assert_eq!(
            action,
            ModerationAction::Rebuke {
                message: "Oi, I don't concur with this Polish! We only use English here.\n"
                    .to_string()
            }
        );
    }

    #[test]
    fn test_helpful_rebuke_includes_translation() {
        let text = compose_rebuke(
            &violation("here is text in Polish"),
            false,
            &config(true, false),
        );
        assert!(text.ends_with("BTW, we know you mean \"here is text in Polish\""));
    }

    #[test]
    fn test_helpful_rebuke_without_useful_translation() {
        let text = compose_rebuke(
            &violation("oto tekst po polsku"),
            false,
            &config(true, false),
        );
        assert!(text.ends_with("BTW, we've no idea what you tried to say."));
    }

    #[test]
    fn test_mute_planned_only_for_non_admins() {
        let cfg = config(false, true);
        let verdict = violation("here is text in Polish");

        let member = plan_action(&verdict, false, &cfg);
        assert!(matches!(
            member,
            ModerationAction::RebukeAndMute { duration, ref message }
                if duration == Duration::from_secs(30) && message.contains("muted for 30 seconds")
        ));

        let admin = plan_action(&verdict, true, &cfg);
        assert!(matches!(
            admin,
            ModerationAction::Rebuke { ref message } if !message.contains("muted")
        ));
    }

    #[tokio::test]
    async fn test_admin_is_rebuked_but_not_muted() {
        let client = Arc::new(RecordingClient::new(vec![ADMIN]));
        let orchestrator = ActionOrchestrator::new(Arc::clone(&client), config(false, true));

        let action = orchestrator
            .act(&message(ADMIN, "oto tekst po polsku"), &violation("here is text in Polish"))
            .await;

        assert!(matches!(action, ModerationAction::Rebuke { .. }));
        assert_eq!(client.count(|c| matches!(c, Call::Reply { .. })), 1);
        assert_eq!(client.count(|c| matches!(c, Call::Restrict(_))), 0);
        assert_eq!(orchestrator.mutes().pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_member_is_muted_then_unmuted_exactly_once() {
        let client = Arc::new(RecordingClient::new(vec![ADMIN]));
        let orchestrator = ActionOrchestrator::new(Arc::clone(&client), config(false, true));

        let action = orchestrator
            .act(&message(MEMBER, "oto tekst po polsku"), &violation("here is text in Polish"))
            .await;

        assert!(matches!(action, ModerationAction::RebukeAndMute { .. }));
        assert_eq!(client.calls()[0], Call::Restrict(MEMBER));
        assert_eq!(
            client.calls()[1],
            Call::Reply {
                reply_to: Some(300),
                text: "Oi, I don't concur with this Polish! We only use English here.\n\
                       You've been muted for 30 seconds.\n"
                    .to_string()
            }
        );

        tokio::time::sleep(Duration::from_millis(29_000)).await;
        settle().await;
        assert_eq!(client.count(|c| matches!(c, Call::Unrestrict(_))), 0);

        tokio::time::sleep(Duration::from_millis(1_001)).await;
        settle().await;
        assert_eq!(client.count(|c| *c == Call::Unrestrict(MEMBER)), 1);

        tokio::time::sleep(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(client.count(|c| matches!(c, Call::Unrestrict(_))), 1);
    }

    #[tokio::test]
    async fn test_no_mute_when_muting_disabled() {
        let client = Arc::new(RecordingClient::new(vec![]));
        let orchestrator = ActionOrchestrator::new(Arc::clone(&client), config(true, false));

        let action = orchestrator
            .act(&message(MEMBER, "oto tekst po polsku"), &violation("here is text in Polish"))
            .await;

        assert!(matches!(action, ModerationAction::Rebuke { .. }));
        assert_eq!(client.count(|c| matches!(c, Call::Restrict(_))), 0);
    }

    #[tokio::test]
    async fn test_failed_admin_lookup_does_not_mute() {
        let mut recording = RecordingClient::new(vec![]);
        recording.fail_admin_lookup = true;
        let client = Arc::new(recording);
        let orchestrator = ActionOrchestrator::new(Arc::clone(&client), config(false, true));

        let action = orchestrator
            .act(&message(MEMBER, "oto tekst po polsku"), &violation("here is text in Polish"))
            .await;

        assert!(matches!(action, ModerationAction::Rebuke { .. }));
        assert_eq!(client.count(|c| matches!(c, Call::Restrict(_))), 0);
    }

    #[tokio::test]
    async fn test_failed_reply_is_not_fatal() {
        let mut recording = RecordingClient::new(vec![]);
        recording.fail_replies = true;
        let client = Arc::new(recording);
        let orchestrator = ActionOrchestrator::new(Arc::clone(&client), config(false, false));

        let action = orchestrator
            .act(&message(MEMBER, "oto tekst po polsku"), &violation("here is text in Polish"))
            .await;

        assert!(matches!(action, ModerationAction::Rebuke { .. }));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_restrict_sends_plain_rebuke() {
        let mut recording = RecordingClient::new(vec![]);
        recording.fail_restrict = true;
        let client = Arc::new(recording);
        let orchestrator = ActionOrchestrator::new(Arc::clone(&client), config(false, true));

        let action = orchestrator
            .act(&message(MEMBER, "oto tekst po polsku"), &violation("here is text in Polish"))
            .await;

        assert_eq!(
            action,
            ModerationAction::Rebuke {
                message: "Oi, I don't concur with this Polish! We only use English here.\n"
                    .to_string()
            }
        );
        assert_eq!(
            client.calls(),
            vec![Call::Reply {
                reply_to: Some(300),
                text: "Oi, I don't concur with this Polish! We only use English here.\n"
                    .to_string()
            }]
        );
        assert_eq!(orchestrator.mutes().pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_unrestrict_is_attempted_once() {
        let mut recording = RecordingClient::new(vec![]);
        recording.fail_unrestrict = true;
        let client = Arc::new(recording);
        let orchestrator = ActionOrchestrator::new(Arc::clone(&client), config(false, true));

        let action = orchestrator
            .act(&message(MEMBER, "oto tekst po polsku"), &violation("here is text in Polish"))
            .await;
        assert!(matches!(action, ModerationAction::RebukeAndMute { .. }));

        tokio::time::sleep(Duration::from_millis(30_001)).await;
        settle().await;
        assert_eq!(client.count(|c| *c == Call::Unrestrict(MEMBER)), 1);
        assert_eq!(orchestrator.mutes().pending_count(), 0);

        tokio::time::sleep(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(client.count(|c| matches!(c, Call::Unrestrict(_))), 1);
    }

    #[tokio::test]
    async fn test_clean_verdict_touches_nothing() {
        let client = Arc::new(RecordingClient::new(vec![]));
        let orchestrator = ActionOrchestrator::new(Arc::clone(&client), config(true, true));

        let mut verdict = violation("here is text in Polish");
        verdict.should_act = false;

        let action = orchestrator.act(&message(MEMBER, "hello everyone"), &verdict).await;
        assert_eq!(action, ModerationAction::NoAction);
        assert!(client.calls().is_empty());
    }

    struct EmptyStore;

    #[async_trait]
    impl ExceptionStore for EmptyStore {
        async fn add(&self, _entry: ExceptionEntry) -> Result<(), ExceptionError> {
            Ok(())
        }

        async fn remove(&self, _group_id: u64, _text: &str) -> Result<u64, ExceptionError> {
            Ok(0)
        }

        async fn list(&self, _group_id: u64) -> Result<Vec<ExceptionEntry>, ExceptionError> {
            Ok(Vec::new())
        }
    }

    struct PolishProvider;

    #[async_trait]
    impl TranslationProvider for PolishProvider {
        fn name(&self) -> &'static str {
            "polish"
        }

        async fn translate(
            &self,
            _text: &str,
            _target_language: &str,
        ) -> Result<ProviderTranslation, TranslationError> {
            Ok(ProviderTranslation {
                detected_language_code: "pl".to_string(),
                translated_text: "here is text in Polish".to_string(),
                confidence: 0.95,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_pipeline_mutes_member() {
        let cfg = config(true, true);
        let service = ModerationService::new(
            EmptyStore,
            TranslatorService::new(vec![Box::new(PolishProvider)]),
            cfg.clone(),
        );
        let client = Arc::new(RecordingClient::new(vec![ADMIN]));
        let orchestrator = ActionOrchestrator::new(Arc::clone(&client), cfg);

        let msg = message(MEMBER, "oto tekst po polsku");
        let verdict = service.check_message(msg.conversation.group_id, &msg.text).await;
        let action = orchestrator.act(&msg, &verdict).await;

        match action {
            ModerationAction::RebukeAndMute { message, .. } => {
                assert!(message.contains("Polish"));
                assert!(message.contains("BTW, we know you mean \"here is text in Polish\""));
            }
            other => panic!("expected mute, got {:?}", other),
        }

        tokio::time::sleep(Duration::from_millis(30_001)).await;
        settle().await;
        assert_eq!(client.count(|c| *c == Call::Unrestrict(MEMBER)), 1);
    }
}
