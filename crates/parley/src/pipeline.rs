//! The resolution pipeline.
//!
//! A template is entity-decoded, run through global substitution once and
//! then through [`STAGES`] in order. Each stage maps the buffer to a new
//! buffer; a blank buffer short-circuits every later stage.

use tracing::{debug, trace};

use crate::collaborators::Collaborators;
use crate::config::ResolverConfig;
use crate::context::ResolutionContext;
use crate::dispatch::EmptyPolicy::{ClearMessage, LeaveMessage};
use crate::dispatch::WildcardMode::{CommandBody, FreeText, Greedy, Identifier, Token, WordBoundary};
use crate::dispatch::{self, PlaceholderRule};
use crate::entities;
use crate::resolvers::{
    self, ChannelField, CommandForm, Gate, ResolverKind, Role, UserPool, VariableForm,
};

/// What a stage does with the buffer.
#[derive(Debug, Clone, Copy)]
pub enum StageBody {
    /// Resolve each rule's matches under its empty policy.
    Rules(&'static [PlaceholderRule]),
    /// Substitute `$sender` and the context attributes.
    Attributes,
    /// A closed gate blanks the buffer; an open one removes its token.
    Gates(&'static [PlaceholderRule]),
    /// Run the first `(api|…)` call and fill in its projections.
    ApiProjection,
}

/// One named step of the pipeline.
#[derive(Debug)]
pub struct Stage {
    pub name: &'static str,
    pub body: StageBody,
}

static PRICE: [PlaceholderRule; 1] =
    [PlaceholderRule::new("(price)", FreeText, ClearMessage, ResolverKind::Price)];

static INFO: [PlaceholderRule; 3] = [
    PlaceholderRule::new("$toptip.#.#", WordBoundary, ClearMessage, ResolverKind::TopTip),
    PlaceholderRule::new("(game)", FreeText, ClearMessage, ResolverKind::Game),
    PlaceholderRule::new("(status)", FreeText, ClearMessage, ResolverKind::Status),
];

static RANDOM: [PlaceholderRule; 8] = [
    PlaceholderRule::new(
        "(random.online.viewer)",
        FreeText,
        ClearMessage,
        ResolverKind::RandomUser(UserPool::new(true, Role::Viewer)),
    ),
    PlaceholderRule::new(
        "(random.online.follower)",
        FreeText,
        ClearMessage,
        ResolverKind::RandomUser(UserPool::new(true, Role::Follower)),
    ),
    PlaceholderRule::new(
        "(random.online.subscriber)",
        FreeText,
        ClearMessage,
        ResolverKind::RandomUser(UserPool::new(true, Role::Subscriber)),
    ),
    PlaceholderRule::new(
        "(random.viewer)",
        FreeText,
        ClearMessage,
        ResolverKind::RandomUser(UserPool::new(false, Role::Viewer)),
    ),
    PlaceholderRule::new(
        "(random.follower)",
        FreeText,
        ClearMessage,
        ResolverKind::RandomUser(UserPool::new(false, Role::Follower)),
    ),
    PlaceholderRule::new(
        "(random.subscriber)",
        FreeText,
        ClearMessage,
        ResolverKind::RandomUser(UserPool::new(false, Role::Subscriber)),
    ),
    PlaceholderRule::new(
        "(random.number-#-to-#)",
        FreeText,
        ClearMessage,
        ResolverKind::RandomNumber,
    ),
    PlaceholderRule::new(
        "(random.true-or-false)",
        FreeText,
        ClearMessage,
        ResolverKind::RandomBool,
    ),
];

static CONDITIONAL: [PlaceholderRule; 1] =
    [PlaceholderRule::new("(if #)", FreeText, LeaveMessage, ResolverKind::Conditional)];

static VARIABLES: [PlaceholderRule; 3] = [
    PlaceholderRule::new(
        "$!!_#",
        Identifier,
        ClearMessage,
        ResolverKind::Variable(VariableForm::Silent),
    ),
    PlaceholderRule::new(
        "$!_#",
        Identifier,
        ClearMessage,
        ResolverKind::Variable(VariableForm::Quiet),
    ),
    PlaceholderRule::new(
        "$_#",
        Identifier,
        ClearMessage,
        ResolverKind::Variable(VariableForm::Verbose),
    ),
];

static SANDBOX: [PlaceholderRule; 1] =
    [PlaceholderRule::new("(eval #)", Greedy, ClearMessage, ResolverKind::Sandbox)];

static PARAMS: [PlaceholderRule; 3] = [
    PlaceholderRule::new("$touser", WordBoundary, ClearMessage, ResolverKind::ToUser),
    PlaceholderRule::new("$!param", WordBoundary, ClearMessage, ResolverKind::ParamOrNa),
    PlaceholderRule::new("$param", WordBoundary, ClearMessage, ResolverKind::Param),
];

static MATH: [PlaceholderRule; 1] =
    [PlaceholderRule::new("(math.#)", FreeText, ClearMessage, ResolverKind::Math)];

static ONLINE: [PlaceholderRule; 2] = [
    PlaceholderRule::new(
        "(onlineonly)",
        Token,
        ClearMessage,
        ResolverKind::Online(Gate::OnlineOnly),
    ),
    PlaceholderRule::new(
        "(offlineonly)",
        Token,
        ClearMessage,
        ResolverKind::Online(Gate::OfflineOnly),
    ),
];

static COMMAND: [PlaceholderRule; 4] = [
    PlaceholderRule::new("$count('#')", CommandBody, LeaveMessage, ResolverKind::CountOf),
    PlaceholderRule::new("$count", CommandBody, LeaveMessage, ResolverKind::Count),
    PlaceholderRule::new(
        "(!!#)",
        CommandBody,
        LeaveMessage,
        ResolverKind::Command(CommandForm::Silent),
    ),
    PlaceholderRule::new(
        "(!#)",
        CommandBody,
        LeaveMessage,
        ResolverKind::Command(CommandForm::Visible),
    ),
];

static QUERY: [PlaceholderRule; 2] = [
    PlaceholderRule::new("$querystring", WordBoundary, LeaveMessage, ResolverKind::QueryString),
    PlaceholderRule::new("(url|#)", FreeText, LeaveMessage, ResolverKind::UrlEncode),
];

static LIST: [PlaceholderRule; 1] =
    [PlaceholderRule::new("(list.#)", FreeText, ClearMessage, ResolverKind::List)];

static STREAM: [PlaceholderRule; 3] = [
    PlaceholderRule::new(
        "(stream|#|game)",
        FreeText,
        ClearMessage,
        ResolverKind::Stream(ChannelField::Game),
    ),
    PlaceholderRule::new(
        "(stream|#|title)",
        FreeText,
        ClearMessage,
        ResolverKind::Stream(ChannelField::Title),
    ),
    PlaceholderRule::new(
        "(stream|#|viewers)",
        FreeText,
        ClearMessage,
        ResolverKind::Stream(ChannelField::Viewers),
    ),
];

/// The stages in the order they run.
pub static STAGES: [Stage; 15] = [
    Stage { name: "price", body: StageBody::Rules(&PRICE) },
    Stage { name: "info", body: StageBody::Rules(&INFO) },
    Stage { name: "random", body: StageBody::Rules(&RANDOM) },
    Stage { name: "if", body: StageBody::Rules(&CONDITIONAL) },
    Stage { name: "variables", body: StageBody::Rules(&VARIABLES) },
    Stage { name: "eval", body: StageBody::Rules(&SANDBOX) },
    Stage { name: "param", body: StageBody::Rules(&PARAMS) },
    Stage { name: "attributes", body: StageBody::Attributes },
    Stage { name: "math", body: StageBody::Rules(&MATH) },
    Stage { name: "online", body: StageBody::Gates(&ONLINE) },
    Stage { name: "command", body: StageBody::Rules(&COMMAND) },
    Stage { name: "qs", body: StageBody::Rules(&QUERY) },
    Stage { name: "list", body: StageBody::Rules(&LIST) },
    Stage { name: "stream", body: StageBody::Rules(&STREAM) },
    Stage { name: "api", body: StageBody::ApiProjection },
];

/// Resolves response templates against a set of collaborators.
///
/// # Example
///
/// ```
/// use parley::{Collaborators, ResolutionContext, Resolver, ResolverConfig, Sender};
///
/// # #[tokio::main]
/// # async fn main() {
/// let resolver = Resolver::new(ResolverConfig::default(), Collaborators::default());
/// let ctx = ResolutionContext::builder().sender(Sender::new("viewer")).build();
/// assert_eq!(resolver.resolve("Hello $sender", &ctx).await, "Hello @viewer");
/// # }
/// ```
#[derive(Clone)]
pub struct Resolver {
    config: ResolverConfig,
    collaborators: Collaborators,
}

impl Resolver {
    pub fn new(config: ResolverConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Resolve `template` into the final response text.
    ///
    /// Never fails: a placeholder that cannot be resolved falls back to the
    /// literal its rule prescribes, which may blank the whole response.
    pub async fn resolve(&self, template: &str, ctx: &ResolutionContext) -> String {
        let decoded = entities::decode(template);
        let substituted = resolvers::global::substitute(self, decoded).await;
        let mut buffer = entities::decode(&substituted);

        for stage in &STAGES {
            if buffer.trim().is_empty() {
                break;
            }
            buffer = self.run_stage(stage, buffer, ctx).await;
            trace!(stage = stage.name, buffer = %buffer, "stage applied");
        }
        debug!(
            command = ?ctx.command,
            sender = %ctx.sender.username,
            "template resolved"
        );
        buffer
    }

    async fn run_stage(&self, stage: &Stage, buffer: String, ctx: &ResolutionContext) -> String {
        match stage.body {
            StageBody::Rules(rules) => dispatch::apply_rules(self, buffer, rules, ctx).await,
            StageBody::Attributes => {
                resolvers::params::substitute_attributes(buffer, &self.config, ctx)
            }
            StageBody::Gates(rules) => dispatch::apply_gates(self, buffer, rules, ctx).await,
            StageBody::ApiProjection => resolvers::api::project(self, buffer).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_fixed() {
        let names: Vec<&str> = STAGES.iter().map(|stage| stage.name).collect();
        assert_eq!(
            names,
            vec![
                "price",
                "info",
                "random",
                "if",
                "variables",
                "eval",
                "param",
                "attributes",
                "math",
                "online",
                "command",
                "qs",
                "list",
                "stream",
                "api",
            ]
        );
    }

    #[test]
    fn top_tip_segments_stop_at_word_boundaries() {
        let rule = &INFO[0];
        assert_eq!(rule.pattern, "$toptip.#.#");
        assert_eq!(rule.mode, WordBoundary);
    }

    #[test]
    fn every_rule_pattern_compiles() {
        for stage in &STAGES {
            if let StageBody::Rules(rules) | StageBody::Gates(rules) = stage.body {
                for rule in rules {
                    assert!(rule.regex().is_some(), "{} does not compile", rule.pattern);
                }
            }
        }
    }
}
