//! Route command implementation

use crate::cli::output::{format_decision_json, format_decision_text};
use crate::cli::RouteArgs;
use crate::config::SwitchboardConfig;
use crate::metrics::{setup_metrics, MetricsCollector};
use crate::routing::{AcceptAll, ConversationTurn, Router};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Handle `switchboard route` command
///
/// Evaluates the turn by default. With `--dispatch` the turn goes through
/// the full routing loop against a dispatcher that accepts every handoff;
/// Ctrl-C cancels it.
pub async fn handle_route(args: &RouteArgs, config: &SwitchboardConfig) -> anyhow::Result<String> {
    let prometheus = if args.metrics {
        Some(
            setup_metrics()
                .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))?,
        )
    } else {
        None
    };

    let router = Router::from_config(config)?;
    let text = args.text.join(" ");
    let turn = match &args.session {
        Some(session) => ConversationTurn::new(session, &args.agent, text),
        None => ConversationTurn::ad_hoc(&args.agent, text),
    };

    let decision = if args.dispatch {
        let cancel = CancellationToken::new();
        let ctrl_c = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };
        let result = router.route(&turn, &AcceptAll, &cancel).await;
        ctrl_c.abort();
        result?
    } else {
        router.evaluate(&turn)?
    };

    let mut output = if args.json {
        format_decision_json(&turn, &decision)?
    } else {
        format_decision_text(&decision)
    };

    if let Some(handle) = prometheus {
        let collector = MetricsCollector::new(
            Arc::clone(router.registry()),
            Arc::clone(router.breakers()),
            handle,
        );
        output.push_str("\n\n");
        output.push_str(&collector.render_metrics());
    }

    Ok(output)
}
