//! Declarative macros for ergonomic effect construction
//!
//! Almost every effect a Staybook reducer returns is "await one gateway call,
//! then turn its `Result` into the next action". These macros remove that
//! boilerplate.

/// Create an `Effect::Future` from a fallible async call
///
/// The call expression is awaited inside the effect; exactly one of the two
/// branches runs and must evaluate to `Option<Action>`.
///
/// # Example
///
/// ```rust,ignore
/// use staybook_core::request_effect;
///
/// request_effect! {
///     call: api.cancel_reservation(booking_id),
///     on_success: |message| Some(BookingAction::CancellationAcknowledged { booking_id, message }),
///     on_error: |error| Some(BookingAction::CancellationRejected { booking_id, error })
/// }
/// ```
#[macro_export]
macro_rules! request_effect {
    (
        call: $call:expr,
        on_success: |$success_param:pat_param| $success_body:expr,
        on_error: |$error_param:pat_param| $error_body:expr
    ) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move {
            match $call.await {
                ::std::result::Result::Ok($success_param) => $success_body,
                ::std::result::Result::Err($error_param) => $error_body,
            }
        }))
    };
}
