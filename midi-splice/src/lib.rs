pub mod augment;
pub mod config;
pub mod events;
pub mod io;
pub mod num;
pub mod sequence;

/// Chains calls left to right: `pipe! { x |>f(a) |>g() }` expands to `g(f(x, a))`.
#[macro_export]
macro_rules! pipe {
    ($var:tt |> $function: ident($($params: expr),*) $($calls:tt)*) => {
        pipe!({$function($var, $($params),*)} $($calls)*)
    };
    ($var:tt |> $namespace1:ident :: $function: ident($($params: expr),*) $($calls:tt)*) => {
        pipe!({$namespace1::$function($var, $($params),*)} $($calls)*)
    };
    ($var:tt |> $namespace1:ident :: $namespace2:ident :: $function: ident($($params: expr),*) $($calls:tt)*) => {
        pipe!({$namespace1::$namespace2::$function($var, $($params),*)} $($calls)*)
    };
    ($var:tt . $function: ident $( :: < $($types: tt $(< $types2: tt >)? ),* > )? ( $($params: expr),* ) $($calls:tt)*) => {
        pipe!({$var.$function $( :: < $($types $(< $types2 >)?),* > )? ( $($params),* )} $($calls)*)
    };
    ($var:tt . $field: ident $($calls:tt)* ) => {
        pipe!({ $var.$field } $($calls)*)
    };
    ($var:tt) => {
        $var
    };
}

#[cfg(test)]
mod tests {
    use crate::{
        events::Event,
        sequence::{event::filter_events, to_vec_result, wrap_ok},
    };

    #[test]
    fn pipe_chains_functions_and_methods() {
        let events = vec![
            Event::new_delta_note_on_event(10u64, 9, 36, 100),
            Event::new_delta_control_event(10, 0xB9, vec![7, 90]),
        ];
        let kept: Vec<_> = pipe! {
            events.into_iter()
            |>wrap_ok()
            |>filter_events(|e| e.is_note())
            |>to_vec_result().unwrap()
        };
        assert_eq!(kept, vec![Event::new_delta_note_on_event(10u64, 9, 36, 100)]);
    }
}
