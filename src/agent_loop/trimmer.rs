//! Bounds the history sent to the model on each reasoning step.

use crate::types::{Message, Role};

/// Default cost budget per reasoning step.
pub const DEFAULT_HISTORY_BUDGET: usize = 4000;

pub fn estimate_text_cost(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.chars().count().div_ceil(4)
}

/// Approximate token cost: a quarter of the characters in the content,
/// tool-call names and serialized arguments.
pub fn estimate_message_cost(message: &Message) -> usize {
    let calls: usize = message
        .tool_calls
        .iter()
        .map(|call| {
            let args = serde_json::to_string(&call.arguments).unwrap_or_default();
            estimate_text_cost(&call.name) + estimate_text_cost(&args)
        })
        .sum();
    estimate_text_cost(&message.content) + calls
}

/// Newest suffix of `history` that fits `budget`.
///
/// `history[live_index..]` is always kept, whatever it costs. Older messages
/// are added newest first in whole units (a message, or an assistant tool-call
/// message with the tool results answering it) until the first unit that does
/// not fit. The result never starts with a tool message.
pub fn trim_history(history: &[Message], budget: usize, live_index: usize) -> &[Message] {
    let mut start = live_index.min(history.len());
    while start > 0 && start < history.len() && history[start].role == Role::Tool {
        start -= 1;
    }
    let mut used: usize = history[start..].iter().map(estimate_message_cost).sum();

    while start > 0 {
        let mut unit_start = start - 1;
        while unit_start > 0 && history[unit_start].role == Role::Tool {
            unit_start -= 1;
        }
        if history[unit_start].role == Role::Tool {
            break;
        }
        let cost: usize = history[unit_start..start]
            .iter()
            .map(estimate_message_cost)
            .sum();
        if used + cost > budget {
            break;
        }
        used += cost;
        start = unit_start;
    }
    &history[start..]
}

/// History trimmer with a fixed budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryTrimmer {
    pub budget: usize,
}

impl Default for HistoryTrimmer {
    fn default() -> Self {
        Self {
            budget: DEFAULT_HISTORY_BUDGET,
        }
    }
}

impl HistoryTrimmer {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn trim<'a>(&self, history: &'a [Message], live_index: usize) -> &'a [Message] {
        trim_history(history, self.budget, live_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ToolCall, ToolResult};

    /// Text costing exactly `cost` units.
    fn text(cost: usize) -> String {
        "x".repeat(cost * 4)
    }

    fn tool_exchange(id: &str, result_cost: usize) -> Vec<Message> {
        let call = ToolCall {
            id: id.into(),
            name: "help".into(),
            arguments: serde_json::json!({}),
        };
        vec![
            Message::assistant_with_tool_calls("", vec![call.clone()]),
            Message::tool_result(&ToolResult::success(&call, text(result_cost))),
        ]
    }

    #[test]
    fn cost_counts_content_and_tool_calls() {
        assert_eq!(estimate_message_cost(&Message::user("")), 0);
        assert_eq!(estimate_message_cost(&Message::user("abcde")), 2);
        // "help" = 1, "{}" = 1
        assert_eq!(estimate_message_cost(&tool_exchange("c1", 0)[0]), 2);
    }

    #[test]
    fn everything_fits_within_budget() {
        let history = vec![
            Message::user(text(10)),
            Message::assistant(text(10)),
            Message::user(text(10)),
        ];
        assert_eq!(trim_history(&history, 100, 2).len(), 3);
    }

    #[test]
    fn stops_at_first_unit_that_does_not_fit() {
        let history = vec![
            Message::user(text(1)),
            Message::assistant(text(50)),
            Message::user(text(10)),
            Message::assistant(text(10)),
            Message::user(text(10)),
        ];
        let kept = trim_history(&history, 35, 4);
        // The cheap first message would fit, but is older than one that does not.
        assert_eq!(kept, &history[2..]);
    }

    #[test]
    fn live_message_survives_even_over_budget() {
        let history = vec![Message::assistant(text(5)), Message::user(text(500))];
        let kept = trim_history(&history, 10, 1);
        assert_eq!(kept, &history[1..]);
    }

    #[test]
    fn tool_units_are_kept_or_dropped_whole() {
        let mut history = vec![Message::user(text(5))];
        history.extend(tool_exchange("c1", 20));
        history.push(Message::user(text(5)));

        // 5 (live) + 2 + 20 fits in 30; the first user (5) does not.
        let kept = trim_history(&history, 30, 3);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].role, Role::Assistant);

        // The tool result alone would fit, but not together with its call.
        let kept = trim_history(&history, 25, 3);
        assert_eq!(kept, &history[3..]);
    }

    #[test]
    fn never_starts_with_a_tool_message() {
        let mut history = vec![Message::user(text(1))];
        history.extend(tool_exchange("c1", 1));
        history.extend(tool_exchange("c2", 1));
        history.push(Message::user(text(1)));
        let live = history.len() - 1;
        let live_cost = estimate_message_cost(&history[live]);
        for budget in 0..20 {
            let kept = trim_history(&history, budget, live);
            assert_ne!(kept[0].role, Role::Tool, "budget {budget}");

            // A contiguous, in-order suffix that still ends with the live message.
            assert_eq!(kept, &history[history.len() - kept.len()..], "budget {budget}");
            assert_eq!(kept.last(), history.last());

            // Only the live message may push the window over budget.
            let cost: usize = kept.iter().map(estimate_message_cost).sum();
            assert!(cost <= budget.max(live_cost), "budget {budget}: kept cost {cost}");
        }
    }

    #[test]
    fn live_index_inside_a_tool_unit_pulls_in_its_call() {
        let mut history = vec![Message::user(text(1))];
        history.extend(tool_exchange("c1", 1));
        let kept = trim_history(&history, 0, 2);
        assert_eq!(kept, &history[1..]);
    }

    #[test]
    fn empty_history_trims_to_empty() {
        assert!(trim_history(&[], 10, 0).is_empty());
    }

    #[test]
    fn trimming_is_deterministic() {
        let history: Vec<Message> = (0..20)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(text(i))
                } else {
                    Message::assistant(text(i))
                }
            })
            .collect();
        let trimmer = HistoryTrimmer::new(60);
        assert_eq!(trimmer.trim(&history, 19), trimmer.trim(&history, 19));
    }
}
