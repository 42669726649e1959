use crate::session::model::{Message, Role};

/// Fold one streaming increment into a conversation log.
///
/// `started` says whether this stream already owns the tail message. The first
/// non-empty increment appends a new assistant message; every later one is
/// concatenated onto the tail. Returns the new `started` value.
pub fn append_or_merge_last(
    log: &mut Vec<Message>,
    started: bool,
    delta: &str,
    specialist_id: &str,
) -> bool {
    if !started {
        if delta.is_empty() {
            return false;
        }
        log.push(Message::assistant(delta).with_specialist(specialist_id));
        return true;
    }

    match log.last_mut() {
        Some(last) if last.role == Role::Assistant => {
            last.content.push_str(delta);
        }
        // The tail was removed underneath us; start a fresh partial message.
        _ => log.push(Message::assistant(delta).with_specialist(specialist_id)),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(log: &mut Vec<Message>, deltas: &[&str]) -> bool {
        let mut started = false;
        for delta in deltas {
            started = append_or_merge_last(log, started, delta, "analyst");
        }
        started
    }

    #[test]
    fn test_first_increment_appends_later_merge() {
        let mut log = vec![Message::user("hello")];
        let started = append_or_merge_last(&mut log, false, "Hi", "analyst");
        assert!(started);
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].content, "Hi");

        append_or_merge_last(&mut log, started, " there", "analyst");
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].content, "Hi there");
        assert_eq!(log[1].specialist_id.as_deref(), Some("analyst"));
    }

    #[test]
    fn test_leading_empty_increments_are_ignored() {
        let mut log = vec![Message::user("q")];
        let started = fold(&mut log, &["", "", "a"]);
        assert!(started);
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].content, "a");
    }

    #[test]
    fn test_concatenation_for_many_increments() {
        let deltas: Vec<String> = (0..50).map(|i| format!("t{i} ")).collect();
        let refs: Vec<&str> = deltas.iter().map(String::as_str).collect();
        let mut log = vec![Message::user("q")];
        fold(&mut log, &refs);

        assert_eq!(log.len(), 2);
        assert_eq!(log[1].content, deltas.concat());
        let partials = log.iter().filter(|m| m.role == Role::Assistant).count();
        assert_eq!(partials, 1);
    }

    #[test]
    fn test_merge_preserves_earlier_fields() {
        let mut log = vec![Message::user("q")];
        let started = append_or_merge_last(&mut log, false, "a", "analyst");
        let created = log[1].created_at;
        append_or_merge_last(&mut log, started, "b", "analyst");
        assert_eq!(log[1].created_at, created);
        assert_eq!(log[0].content, "q");
    }
}
