use crate::models::NavigationState;
use crate::navigation::{NAVIGATE_NEXT, NAVIGATE_PREV};
use crate::render::{NavLabels, NavigateFn, Spacing};
use leptos::prelude::*;
use leptos::task::spawn_local;

pub(crate) const BOTTOM_CONTAINER_ID: &str = "page-nav-plugin-container";
pub(crate) const SIDE_CONTAINER_ID: &str = "page-nav-side-container";

const ICON_LEFT: &str = "#iconLeft";
const ICON_RIGHT: &str = "#iconRight";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Prev,
    Next,
}

impl Direction {
    fn offset(self) -> i32 {
        match self {
            Self::Prev => NAVIGATE_PREV,
            Self::Next => NAVIGATE_NEXT,
        }
    }

    fn class(self) -> &'static str {
        match self {
            Self::Prev => "b3-button b3-button--outline page-nav-button page-nav-button--prev",
            Self::Next => "b3-button b3-button--outline page-nav-button page-nav-button--next",
        }
    }

    fn icon_markup(self) -> String {
        let href = match self {
            Self::Prev => ICON_LEFT,
            Self::Next => ICON_RIGHT,
        };
        format!(r#"<use xlink:href="{href}"></use>"#)
    }
}

#[component]
fn NavButton(
    direction: Direction,
    label: String,
    state: ArcRwSignal<NavigationState>,
    on_navigate: NavigateFn,
) -> impl IntoView {
    let disabled = move || {
        let s = state.get();
        match direction {
            Direction::Prev => s.prev_disabled(),
            Direction::Next => s.next_disabled(),
        }
    };

    let icon = view! { <svg class="b3-button__icon" inner_html=direction.icon_markup()></svg> };
    let text = view! { <span>{label}</span> };

    view! {
        <button
            type="button"
            class=direction.class()
            contenteditable="false"
            disabled=disabled
            on:click=move |ev: web_sys::MouseEvent| {
                // Keep the click away from the editor underneath.
                ev.prevent_default();
                ev.stop_propagation();
                spawn_local(on_navigate(direction.offset()));
            }
        >
            {match direction {
                Direction::Prev => view! { {icon} {text} }.into_any(),
                Direction::Next => view! { {text} {icon} }.into_any(),
            }}
        </button>
    }
}

#[component]
fn Indicator(state: ArcRwSignal<NavigationState>) -> impl IntoView {
    view! {
        <span class="page-nav-indicator" contenteditable="false">
            {move || state.get().indicator()}
        </span>
    }
}

/// Horizontal bar appended below the document content.
#[component]
pub(crate) fn BottomNavigation(
    state: ArcRwSignal<NavigationState>,
    visible: ArcRwSignal<bool>,
    spacing: ArcRwSignal<Spacing>,
    labels: NavLabels,
    on_navigate: NavigateFn,
) -> impl IntoView {
    let style = move || {
        let s = spacing.get();
        format!(
            "display: {}; --page-nav-margin-top: {}; --page-nav-margin-bottom: {};",
            if visible.get() { "flex" } else { "none" },
            s.top_css(),
            s.bottom_css()
        )
    };

    view! {
        <div id=BOTTOM_CONTAINER_ID style=style>
            <NavButton
                direction=Direction::Prev
                label=labels.prev
                state=state.clone()
                on_navigate=on_navigate.clone()
            />
            <Indicator state=state.clone() />
            <NavButton direction=Direction::Next label=labels.next state=state on_navigate=on_navigate />
        </div>
    }
}

/// Vertical strip pinned to the side of the editor.
#[component]
pub(crate) fn SideNavigation(
    state: ArcRwSignal<NavigationState>,
    visible: ArcRwSignal<bool>,
    labels: NavLabels,
    on_navigate: NavigateFn,
) -> impl IntoView {
    let style = move || format!("display: {};", if visible.get() { "block" } else { "none" });

    view! {
        <div id=SIDE_CONTAINER_ID style=style>
            <NavButton
                direction=Direction::Prev
                label=labels.prev
                state=state.clone()
                on_navigate=on_navigate.clone()
            />
            <Indicator state=state.clone() />
            <NavButton direction=Direction::Next label=labels.next state=state on_navigate=on_navigate />
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_offsets_and_classes() {
        assert_eq!(Direction::Prev.offset(), -1);
        assert_eq!(Direction::Next.offset(), 1);
        assert!(Direction::Prev.class().ends_with("page-nav-button--prev"));
        assert!(Direction::Next.class().starts_with("b3-button b3-button--outline"));
    }

    #[test]
    fn test_icon_markup_references_host_sprites() {
        assert_eq!(
            Direction::Prev.icon_markup(),
            r##"<use xlink:href="#iconLeft"></use>"##
        );
        assert!(Direction::Next.icon_markup().contains("#iconRight"));
    }
}
