//! System clipboard access for the copy-phrase command.
//!
//! Tests swap the OS clipboard for an in-process cell so they can run
//! headless and assert on what was copied.

#[cfg(not(test))]
mod imp {
    use copypasta::{ClipboardContext, ClipboardProvider};

    pub fn set(contents: &str) -> Result<(), String> {
        let mut ctx = ClipboardContext::new().map_err(|e| e.to_string())?;
        ctx.set_contents(contents.to_string()).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod imp {
    use std::cell::RefCell;

    thread_local! {
        static TEST_CLIPBOARD: RefCell<Option<String>> = const { RefCell::new(None) };
    }

    pub fn set(contents: &str) -> Result<(), String> {
        TEST_CLIPBOARD.with(|cell| *cell.borrow_mut() = Some(contents.to_string()));
        Ok(())
    }

    /// What the last `set` on this thread stored, if anything.
    pub fn last() -> Option<String> {
        TEST_CLIPBOARD.with(|cell| cell.borrow().clone())
    }
}

pub use imp::set;

#[cfg(test)]
pub use imp::last;
