mod navigation;

pub(crate) use navigation::{BottomNavigation, SideNavigation};

use crate::models::NavigationState;
use crate::render::{NavProps, NavView, Spacing};
use crate::settings::LayoutMode;
use leptos::prelude::*;
use navigation::{BOTTOM_CONTAINER_ID, SIDE_CONTAINER_ID};
use std::any::Any;
use web_sys::{Element, HtmlElement, Node};

/// Live Leptos mount of the navigation. Dropping the handle unmounts it.
pub(crate) struct WebNavView {
    state: ArcRwSignal<NavigationState>,
    visible: ArcRwSignal<bool>,
    spacing: ArcRwSignal<Spacing>,
    surface: HtmlElement,
    container: Option<Element>,
    /// Inline `position` of the surface before the side layout overrode it.
    saved_position: Option<String>,
    _handle: Box<dyn Any>,
}

impl NavView for WebNavView {
    fn update(&self, state: NavigationState) {
        self.state.set(state);
    }

    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn apply_spacing(&self, spacing: &Spacing) {
        self.spacing.set(spacing.clone());
    }

    fn is_attached(&self) -> bool {
        let surface: &Node = &self.surface;
        self.container
            .as_ref()
            .and_then(|c| c.parent_node())
            .is_some_and(|parent| parent.is_same_node(Some(surface)))
    }

    fn destroy(self) {
        drop(self);
    }
}

impl Drop for WebNavView {
    fn drop(&mut self) {
        if let Some(previous) = self.saved_position.take() {
            let style = self.surface.style();
            let _ = if previous.is_empty() {
                style.remove_property("position").map(|_| ())
            } else {
                style.set_property("position", &previous)
            };
        }
    }
}

pub(crate) fn mount_navigation(surface: &HtmlElement, props: NavProps) -> WebNavView {
    let NavProps {
        state,
        layout,
        labels,
        visible,
        on_navigate,
    } = props;

    let state = ArcRwSignal::new(state);
    let visible = ArcRwSignal::new(visible);
    let spacing = ArcRwSignal::new(Spacing::default());
    let mut saved_position = None;

    let (handle, container_id) = match layout {
        LayoutMode::Bottom => {
            let (state, visible, spacing) = (state.clone(), visible.clone(), spacing.clone());
            let handle = leptos::mount::mount_to(surface.clone(), move || {
                view! {
                    <BottomNavigation
                        state=state
                        visible=visible
                        spacing=spacing
                        labels=labels
                        on_navigate=on_navigate
                    />
                }
            });
            (Box::new(handle) as Box<dyn Any>, BOTTOM_CONTAINER_ID)
        }
        LayoutMode::Side => {
            // The side strip is absolutely positioned against the editor.
            let style = surface.style();
            saved_position = Some(style.get_property_value("position").unwrap_or_default());
            let _ = style.set_property("position", "relative");
            let (state, visible) = (state.clone(), visible.clone());
            let handle = leptos::mount::mount_to(surface.clone(), move || {
                view! { <SideNavigation state=state visible=visible labels=labels on_navigate=on_navigate /> }
            });
            (Box::new(handle) as Box<dyn Any>, SIDE_CONTAINER_ID)
        }
    };

    let container = surface
        .query_selector(&format!(":scope > #{container_id}"))
        .ok()
        .flatten();

    WebNavView {
        state,
        visible,
        spacing,
        surface: surface.clone(),
        container,
        saved_position,
        _handle: handle,
    }
}
