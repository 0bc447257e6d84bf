//! Declarative macros for ergonomic effect construction
//!
//! These macros cut the `Box::pin(async move { .. })` and `Box::new(..)`
//! noise out of reducers.

/// Create an `Effect::Future` from an async block body
///
/// The body must evaluate to `Option<Action>`.
///
/// # Example
///
/// ```rust,ignore
/// use session_sync_core::async_effect;
///
/// let navigator = env.navigator.clone();
/// async_effect! {
///     navigator.navigate(&target).await;
///     None
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move { $($body)* }))
    };
}

/// Create an `Effect::Delay` that dispatches an action after a duration
///
/// # Example
///
/// ```rust,ignore
/// use session_sync_core::delay;
///
/// delay! {
///     duration: config.settle_delay,
///     action: SessionAction::NavigationSettled
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}
