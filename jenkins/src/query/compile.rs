//! Compile a parsed [`Expression`] into a reusable predicate.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::parser::{CompareOp, ConjOp, Expression};

/// Resolves a field name against a record.
///
/// Unknown fields resolve to an empty string rather than failing; the
/// filter language compares strings only.
pub trait FieldResolver<R: ?Sized>: Send + Sync {
    fn resolve<'r>(&self, record: &'r R, field: &str) -> Cow<'r, str>;
}

impl<R: ?Sized, F: FieldResolver<R> + ?Sized> FieldResolver<R> for Arc<F> {
    fn resolve<'r>(&self, record: &'r R, field: &str) -> Cow<'r, str> {
        (**self).resolve(record, field)
    }
}

type MatchFn<R> = dyn Fn(&R) -> bool + Send + Sync;

/// A compiled filter over records of type `R`.
pub struct Predicate<R: ?Sized> {
    matcher: Box<MatchFn<R>>,
}

impl<R: ?Sized + 'static> Predicate<R> {
    /// A predicate that accepts every record.
    pub fn always() -> Self {
        Self {
            matcher: Box::new(|_: &R| true),
        }
    }

    /// Evaluate the predicate against a record.
    #[inline]
    pub fn matches(&self, record: &R) -> bool {
        (self.matcher)(record)
    }
}

impl<R: ?Sized> fmt::Debug for Predicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").finish_non_exhaustive()
    }
}

/// Compile `expr` into a predicate, resolving fields through `resolver`.
pub fn compile<R, F>(expr: &Expression, resolver: F) -> Predicate<R>
where
    R: ?Sized + 'static,
    F: FieldResolver<R> + 'static,
{
    compile_node(expr, &Arc::new(resolver))
}

fn compile_node<R, F>(expr: &Expression, resolver: &Arc<F>) -> Predicate<R>
where
    R: ?Sized + 'static,
    F: FieldResolver<R> + 'static,
{
    match expr {
        Expression::Empty => Predicate::always(),
        Expression::Comparison { left, op, right } => {
            let resolver = Arc::clone(resolver);
            let field = left.clone();
            let literal = right.clone();
            let matcher: Box<MatchFn<R>> = match op {
                CompareOp::Eq => {
                    Box::new(move |record: &R| resolver.resolve(record, &field) == literal.as_str())
                }
                CompareOp::Ne => {
                    Box::new(move |record: &R| resolver.resolve(record, &field) != literal.as_str())
                }
            };
            Predicate { matcher }
        }
        Expression::Conjugation { op, left, right } => {
            let left = compile_node(left, resolver);
            let right = compile_node(right, resolver);
            let matcher: Box<MatchFn<R>> = match op {
                ConjOp::And => Box::new(move |record: &R| left.matches(record) && right.matches(record)),
                ConjOp::Or => Box::new(move |record: &R| left.matches(record) || right.matches(record)),
            };
            Predicate { matcher }
        }
    }
}
