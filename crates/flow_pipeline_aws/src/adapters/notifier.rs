/// Best-effort notification port. Publish failures are logged and swallowed
/// by the worker; they never affect task acknowledgement.
pub trait Notifier {
    fn publish(&self, subject: &str, message: &str) -> Result<(), String>;
}
