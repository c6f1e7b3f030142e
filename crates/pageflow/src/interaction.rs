//! Primitive element actions.
//!
//! Every function performs exactly one action on an already resolved handle
//! and never waits. Callers are expected to have waited for the right
//! precondition first; a driver refusal surfaces as
//! [`HarnessError::NotInteractable`] and is not retried.

use tracing::{debug, warn};

use crate::driver::{ElementHandle, ScriptArg, Session};
use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};

/// Script used by [`script_click`]
pub const SCRIPT_CLICK: &str = "arguments[0].click();";

/// Dispatch a native click.
///
/// # Errors
///
/// Returns [`HarnessError::NotInteractable`] if the element cannot receive
/// the click right now, or [`HarnessError::StaleReference`] if the handle
/// outlived its node.
pub fn click(session: &dyn Session, handle: &ElementHandle) -> HarnessResult<()> {
    debug!(action = "click", locator = %handle.locator());
    session.click(handle)
}

/// Append `text` to the field's current content without clearing it first.
pub fn type_text(session: &dyn Session, handle: &ElementHandle, text: &str) -> HarnessResult<()> {
    debug!(action = "type", locator = %handle.locator(), len = text.len());
    session.send_keys(handle, text)
}

/// Remove all current content from an editable element.
pub fn clear(session: &dyn Session, handle: &ElementHandle) -> HarnessResult<()> {
    debug!(action = "clear", locator = %handle.locator());
    session.clear(handle)
}

/// Select the `<option>` whose visible text equals `text`.
///
/// Option text is compared after collapsing runs of whitespace and trimming,
/// the way browsers render it. The option is chosen through
/// [`Session::select_option`], not a pointer click, and an option that is
/// already selected is left alone.
///
/// # Errors
///
/// - [`HarnessError::UnexpectedTag`] if `handle` is not a `<select>`
/// - [`HarnessError::OptionNotFound`] if no option matches exactly
pub fn select_by_visible_text(
    session: &dyn Session,
    handle: &ElementHandle,
    text: &str,
) -> HarnessResult<()> {
    let tag = session.tag_name(handle)?;
    if tag != "select" {
        return Err(HarnessError::UnexpectedTag {
            locator: handle.locator().clone(),
            expected: "select".to_string(),
            actual: tag,
        });
    }

    let wanted = normalize_whitespace(text);
    let options = session.find_elements(Some(handle), &Locator::css("option"))?;
    for option in &options {
        if normalize_whitespace(&session.text(option)?) != wanted {
            continue;
        }
        debug!(action = "select", locator = %handle.locator(), option = %wanted);
        if !session.is_selected(option)? {
            session.select_option(handle, option)?;
        }
        return Ok(());
    }

    Err(HarnessError::OptionNotFound {
        locator: handle.locator().clone(),
        text: text.to_string(),
    })
}

/// Move the pointer to the element so it scrolls into view. Best effort.
pub fn scroll_into_view(session: &dyn Session, handle: &ElementHandle) -> HarnessResult<()> {
    debug!(action = "scroll_into_view", locator = %handle.locator());
    session.move_to(handle)
}

/// Resolve `locator` and click it from inside the page.
///
/// This is an escape hatch for controls a native click cannot reach because
/// of overlays or visibility quirks. It skips every interactability check
/// the driver would make, so it can "succeed" on controls a user could never
/// press. Prefer [`click`] after an explicit wait.
///
/// # Errors
///
/// Returns [`HarnessError::NoSuchElement`] if the locator matches nothing, or
/// [`HarnessError::Script`] if the page rejects the script.
pub fn script_click(session: &dyn Session, locator: &Locator) -> HarnessResult<()> {
    let handle = session.find_element(locator)?;
    warn!(locator = %locator, "clicking via script, interactability checks bypassed");
    let _ = session.execute_script(SCRIPT_CLICK, &[ScriptArg::Element(handle)])?;
    Ok(())
}

/// Whether the element is rendered visible. No side effects.
pub fn is_displayed(session: &dyn Session, handle: &ElementHandle) -> HarnessResult<bool> {
    session.is_displayed(handle)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockNode, MockSession, NodeChange, NodeId};

    fn user_type_select(session: &MockSession) -> (Locator, NodeId, NodeId) {
        let select = Locator::xpath("//select[@class='form-control' and @id='user_type']");
        let option = Locator::css("option");
        let parent = session.add(MockNode::new("select"), &[select.clone()]);
        let _ = session.add_child(
            parent,
            MockNode::new("option").with_text("Select").selected(true),
            &[option.clone()],
        );
        let _ = session.add_child(parent, MockNode::new("option").with_text("Staff"), &[option.clone()]);
        let admin = session.add_child(
            parent,
            MockNode::new("option").with_text("  Admin \n"),
            &[option],
        );
        (select, parent, admin)
    }

    mod click_tests {
        use super::*;

        #[test]
        fn test_click_hidden_is_not_interactable() {
            let session = MockSession::new();
            let loc = Locator::css("button");
            let _ = session.add(MockNode::new("button").hidden(), &[loc.clone()]);
            let handle = session.find_element(&loc).unwrap();
            let err = click(&session, &handle).unwrap_err();
            assert!(matches!(err, HarnessError::NotInteractable { .. }));
        }

        #[test]
        fn test_click_does_not_wait() {
            let session = MockSession::new();
            let loc = Locator::css("button");
            let _ = session.add(MockNode::new("button").disabled(), &[loc.clone()]);
            let handle = session.find_element(&loc).unwrap();
            assert!(click(&session, &handle).is_err());
            assert_eq!(session.clock().now_ms(), 0);
        }
    }

    mod text_tests {
        use super::*;

        #[test]
        fn test_type_appends_and_clear_empties() {
            let session = MockSession::new();
            let loc = Locator::xpath("//textarea[@id='news']");
            let id = session.add(MockNode::new("textarea").with_value("Big "), &[loc.clone()]);
            let handle = session.find_element(&loc).unwrap();

            type_text(&session, &handle, "Breaking").unwrap();
            assert_eq!(session.value_of(id), "Big Breaking");
            clear(&session, &handle).unwrap();
            assert_eq!(session.value_of(id), "");
        }
    }

    mod select_tests {
        use super::*;

        #[test]
        fn test_select_matches_normalized_text() {
            let session = MockSession::new();
            let (select, _, admin) = user_type_select(&session);
            let handle = session.find_element(&select).unwrap();
            select_by_visible_text(&session, &handle, "Admin").unwrap();
            assert!(session.is_node_selected(admin));
        }

        #[test]
        fn test_select_is_exact_not_substring() {
            let session = MockSession::new();
            let (select, _, _) = user_type_select(&session);
            let handle = session.find_element(&select).unwrap();
            let err = select_by_visible_text(&session, &handle, "Adm").unwrap_err();
            match err {
                HarnessError::OptionNotFound { text, .. } => assert_eq!(text, "Adm"),
                other => panic!("expected OptionNotFound, got {other:?}"),
            }
        }

        #[test]
        fn test_select_already_selected_is_left_alone() {
            let session = MockSession::new();
            let (select, _, _) = user_type_select(&session);
            let handle = session.find_element(&select).unwrap();
            select_by_visible_text(&session, &handle, "Select").unwrap();
            assert_eq!(session.action_count(), 0);
        }

        #[test]
        fn test_select_option_without_layout_box() {
            let session = MockSession::new();
            let select = Locator::css("select#user_type");
            let option = Locator::css("option");
            let parent = session.add(MockNode::new("select"), &[select.clone()]);
            let staff = session.add_child(
                parent,
                MockNode::new("option").with_text("Staff").selected(true),
                &[option.clone()],
            );
            let admin = session.add_child(
                parent,
                MockNode::new("option").with_text("Admin").hidden(),
                &[option],
            );
            let handle = session.find_element(&select).unwrap();

            select_by_visible_text(&session, &handle, "Admin").unwrap();
            assert!(session.is_node_selected(admin));
            assert!(!session.is_node_selected(staff));
            assert!(!session.was_called("click:"));
            assert!(session.was_called("select:css=select#user_type:css=option"));
        }

        #[test]
        fn test_select_on_disabled_dropdown() {
            let session = MockSession::new();
            let select = Locator::css("select");
            let parent = session.add(MockNode::new("select").disabled(), &[select.clone()]);
            let _ = session.add_child(parent, MockNode::new("option").with_text("Admin"), &[Locator::css("option")]);
            let handle = session.find_element(&select).unwrap();
            let err = select_by_visible_text(&session, &handle, "Admin").unwrap_err();
            assert!(matches!(err, HarnessError::NotInteractable { .. }));
        }

        #[test]
        fn test_select_rejects_non_select() {
            let session = MockSession::new();
            let loc = Locator::css("input");
            let _ = session.add(MockNode::new("input"), &[loc.clone()]);
            let handle = session.find_element(&loc).unwrap();
            let err = select_by_visible_text(&session, &handle, "Admin").unwrap_err();
            assert!(matches!(err, HarnessError::UnexpectedTag { .. }));
        }

        #[test]
        fn test_select_on_stale_handle() {
            let session = MockSession::new();
            let (select, parent, _) = user_type_select(&session);
            let handle = session.find_element(&select).unwrap();
            session.apply(parent, NodeChange::Rerender);
            assert!(select_by_visible_text(&session, &handle, "Admin")
                .unwrap_err()
                .is_stale());
        }
    }

    mod script_click_tests {
        use super::*;
        use crate::mock::Reaction;

        #[test]
        fn test_script_click_reaches_obscured_control() {
            let session = MockSession::new();
            let loc = Locator::xpath("//a[@class='btn btn-rounded btn-danger']");
            let form = Locator::xpath("//textarea[@id='news']");
            let btn = session.add(MockNode::new("a").obscured(), &[loc.clone()]);
            let area = session.add(MockNode::new("textarea").detached(), &[form]);
            session.on_click(btn, Reaction::Apply(vec![area], NodeChange::Attached(true)));

            script_click(&session, &loc).unwrap();
            assert!(session.is_attached(area));
            assert!(session.was_called(&format!("script:{SCRIPT_CLICK}")));
        }

        #[test]
        fn test_script_click_missing_target() {
            let session = MockSession::new();
            let err = script_click(&session, &Locator::css("#nope")).unwrap_err();
            assert!(matches!(err, HarnessError::NoSuchElement { .. }));
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn test_is_displayed_has_no_side_effect() {
            let session = MockSession::new();
            let loc = Locator::css(".alert");
            let _ = session.add(MockNode::new("div"), &[loc.clone()]);
            let handle = session.find_element(&loc).unwrap();
            assert!(is_displayed(&session, &handle).unwrap());
            assert_eq!(session.action_count(), 0);
        }

        #[test]
        fn test_scroll_into_view_clears_offscreen() {
            let session = MockSession::new();
            let loc = Locator::css("button");
            let _ = session.add(MockNode::new("button").offscreen(), &[loc.clone()]);
            let handle = session.find_element(&loc).unwrap();
            scroll_into_view(&session, &handle).unwrap();
            click(&session, &handle).unwrap();
        }
    }
}
