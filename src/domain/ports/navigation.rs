/// Page navigation.
///
/// A redirect replaces the current page; whoever issued it must not act on
/// the old page afterwards.
pub trait Navigator: Send + Sync {
    fn redirect(&self, target: &str);
}
