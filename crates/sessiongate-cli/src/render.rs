//! Plain-text rendering of page states and navigation.

use sessiongate_core::models::{HomeData, ServiceData};
use sessiongate_core::{NavigationEvent, PageState, PageStatus};

pub fn home(state: &PageState<HomeData>) {
    match (&state.status, &state.data) {
        (PageStatus::Ready, Some(data)) => {
            println!("{}", data.message);
            println!("{}", data.description);
        }
        _ => status(state),
    }
}

pub fn service(state: &PageState<ServiceData>) {
    match (&state.status, &state.data) {
        (PageStatus::Ready, Some(data)) => {
            println!("{}", data.message);
            println!("{}", data.description);
            println!("User ID: {}", data.user_id);
        }
        _ => status(state),
    }
}

/// Status line for states that carry no page payload.
pub fn status<T>(state: &PageState<T>) {
    let Some(message) = state.message.as_deref() else {
        return;
    };
    match state.status {
        PageStatus::Error | PageStatus::Unauthorized => eprintln!("{}", message),
        _ => println!("{}", message),
    }
}

pub fn navigation(event: &NavigationEvent) {
    match event {
        NavigationEvent::Route(route) => println!("-> {}", route),
        NavigationEvent::External(url) => {
            println!("Open this URL in your browser to continue:");
            println!();
            println!("  {}", url);
            println!();
        }
    }
}
