// SPDX-License-Identifier: MIT

//! Declarative macros for reducing boilerplate.
//!
//! - [`simple_display!`] — `Display` impl mapping enum variants to string literals
//! - [`builder!`] — test builder struct with Default, setters, and `build()`

/// Generate a `Display` impl that maps enum variants to string literals.
///
/// Unit variants match directly; data-carrying variants use `(..)` to ignore fields.
///
/// ```ignore
/// crate::simple_display! {
///     MyEnum {
///         Foo => "foo",
///         Bar(..) => "bar",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                })
            }
        }
    };
}

/// Generate a test builder (struct + Default + setters + build).
///
/// All generated items are gated behind `#[cfg(any(test, feature = "test-support"))]`.
///
/// ```ignore
/// crate::builder! {
///     pub struct WorkflowStateBuilder => WorkflowState {
///         into { title: String = "untitled" }
///         set { position: i64 = 0 }
///         option { pr_url: String = None }
///         computed { id: WorkflowId = WorkflowId::new() }
///     }
/// }
/// ```
#[macro_export]
macro_rules! builder {
    (
        pub struct $builder:ident => $target:ident {
            $($rest:tt)*
        }
    ) => {
        $crate::__builder_munch! {
            builder = $builder,
            target = $target,
            into = [],
            set = [],
            option = [],
            computed = [],
            rest = [ $($rest)* ],
        }
    };
}

/// Internal tt-muncher for [`builder!`]; accumulates `into`/`set`/`option`/`computed`
/// blocks in any order and emits the builder once the token stream is consumed.
#[doc(hidden)]
#[macro_export]
macro_rules! __builder_munch {
    (
        builder = $builder:ident,
        target = $target:ident,
        into = [ $($into_field:ident : $into_ty:ty = $into_default:expr),* ],
        set = [ $($set_field:ident : $set_ty:ty = $set_default:expr),* ],
        option = [ $($opt_field:ident : $opt_ty:ty = $opt_default:expr),* ],
        computed = [ $($comp_field:ident : $comp_ty:ty = $comp_expr:expr),* ],
        rest = [ into { $( $f:ident : $ty:ty = $d:expr ),* $(,)? } $($rest:tt)* ],
    ) => {
        $crate::__builder_munch! {
            builder = $builder,
            target = $target,
            into = [ $($into_field : $into_ty = $into_default,)* $($f : $ty = $d),* ],
            set = [ $($set_field : $set_ty = $set_default),* ],
            option = [ $($opt_field : $opt_ty = $opt_default),* ],
            computed = [ $($comp_field : $comp_ty = $comp_expr),* ],
            rest = [ $($rest)* ],
        }
    };
    (
        builder = $builder:ident,
        target = $target:ident,
        into = [ $($into_field:ident : $into_ty:ty = $into_default:expr),* ],
        set = [ $($set_field:ident : $set_ty:ty = $set_default:expr),* ],
        option = [ $($opt_field:ident : $opt_ty:ty = $opt_default:expr),* ],
        computed = [ $($comp_field:ident : $comp_ty:ty = $comp_expr:expr),* ],
        rest = [ set { $( $f:ident : $ty:ty = $d:expr ),* $(,)? } $($rest:tt)* ],
    ) => {
        $crate::__builder_munch! {
            builder = $builder,
            target = $target,
            into = [ $($into_field : $into_ty = $into_default),* ],
            set = [ $($set_field : $set_ty = $set_default,)* $($f : $ty = $d),* ],
            option = [ $($opt_field : $opt_ty = $opt_default),* ],
            computed = [ $($comp_field : $comp_ty = $comp_expr),* ],
            rest = [ $($rest)* ],
        }
    };
    (
        builder = $builder:ident,
        target = $target:ident,
        into = [ $($into_field:ident : $into_ty:ty = $into_default:expr),* ],
        set = [ $($set_field:ident : $set_ty:ty = $set_default:expr),* ],
        option = [ $($opt_field:ident : $opt_ty:ty = $opt_default:expr),* ],
        computed = [ $($comp_field:ident : $comp_ty:ty = $comp_expr:expr),* ],
        rest = [ option { $( $f:ident : $ty:ty = $d:expr ),* $(,)? } $($rest:tt)* ],
    ) => {
        $crate::__builder_munch! {
            builder = $builder,
            target = $target,
            into = [ $($into_field : $into_ty = $into_default),* ],
            set = [ $($set_field : $set_ty = $set_default),* ],
            option = [ $($opt_field : $opt_ty = $opt_default,)* $($f : $ty = $d),* ],
            computed = [ $($comp_field : $comp_ty = $comp_expr),* ],
            rest = [ $($rest)* ],
        }
    };
    (
        builder = $builder:ident,
        target = $target:ident,
        into = [ $($into_field:ident : $into_ty:ty = $into_default:expr),* ],
        set = [ $($set_field:ident : $set_ty:ty = $set_default:expr),* ],
        option = [ $($opt_field:ident : $opt_ty:ty = $opt_default:expr),* ],
        computed = [ $($comp_field:ident : $comp_ty:ty = $comp_expr:expr),* ],
        rest = [ computed { $( $f:ident : $ty:ty = $d:expr ),* $(,)? } $($rest:tt)* ],
    ) => {
        $crate::__builder_munch! {
            builder = $builder,
            target = $target,
            into = [ $($into_field : $into_ty = $into_default),* ],
            set = [ $($set_field : $set_ty = $set_default),* ],
            option = [ $($opt_field : $opt_ty = $opt_default),* ],
            computed = [ $($comp_field : $comp_ty = $comp_expr,)* $($f : $ty = $d),* ],
            rest = [ $($rest)* ],
        }
    };
    (
        builder = $builder:ident,
        target = $target:ident,
        into = [ $($into_field:ident : $into_ty:ty = $into_default:expr),* ],
        set = [ $($set_field:ident : $set_ty:ty = $set_default:expr),* ],
        option = [ $($opt_field:ident : $opt_ty:ty = $opt_default:expr),* ],
        computed = [ $($comp_field:ident : $comp_ty:ty = $comp_expr:expr),* ],
        rest = [],
    ) => {
        #[cfg(any(test, feature = "test-support"))]
        pub struct $builder {
            $( $into_field: $into_ty, )*
            $( $set_field: $set_ty, )*
            $( $opt_field: Option<$opt_ty>, )*
        }

        #[cfg(any(test, feature = "test-support"))]
        impl Default for $builder {
            fn default() -> Self {
                Self {
                    $( $into_field: $into_default.into(), )*
                    $( $set_field: $set_default, )*
                    $( $opt_field: $opt_default, )*
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $builder {
            $(
                pub fn $into_field(mut self, v: impl Into<$into_ty>) -> Self {
                    self.$into_field = v.into();
                    self
                }
            )*

            $(
                pub fn $set_field(mut self, v: $set_ty) -> Self {
                    self.$set_field = v;
                    self
                }
            )*

            $(
                pub fn $opt_field(mut self, v: impl Into<$opt_ty>) -> Self {
                    self.$opt_field = Some(v.into());
                    self
                }
            )*

            pub fn build(self) -> $target {
                $target {
                    $( $into_field: self.$into_field, )*
                    $( $set_field: self.$set_field, )*
                    $( $opt_field: self.$opt_field, )*
                    $( $comp_field: $comp_expr, )*
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $target {
            /// Create a builder with test defaults.
            pub fn builder() -> $builder {
                $builder::default()
            }
        }
    };
}
