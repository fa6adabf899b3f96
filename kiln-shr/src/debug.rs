//  DEBUG.rs
//    by the kiln authors
//
//  Created:
//    03 Mar 2026, 09:24:52
//  Last edited:
//    12 Aug 2026, 15:44:08
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements a few formatters for human-readable diagnostics.
//

use std::cell::{RefCell, RefMut};
use std::fmt::{Display, Formatter, Result as FResult};


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prettylist_connects() {
        assert_eq!(PrettyListFormatter::new(Vec::<&str>::new().into_iter(), "or").to_string(), "");
        assert_eq!(PrettyListFormatter::new([ "podman" ].iter(), "or").to_string(), "podman");
        assert_eq!(PrettyListFormatter::new([ "podman", "docker" ].iter(), "or").to_string(), "podman or docker");
        assert_eq!(PrettyListFormatter::new([ "a", "b", "c" ].iter(), "and").to_string(), "a, b and c");
    }

    #[test]
    fn block_wraps() {
        let line: String = (0..80).map(|_| '-').collect();
        assert_eq!(BlockFormatter::new("CONFIG_A=y").to_string(), format!("{}\nCONFIG_A=y\n{}\n", line, line));
    }
}





/***** LIBRARY *****/
/// Defines a struct that can format a large block of text neatly.
pub struct BlockFormatter<S1> {
    /// Reference to the thing to format.
    to_fmt : S1,
}
impl<S1> BlockFormatter<S1> {
    /// Constructor for the BlockFormatter.
    ///
    /// # Arguments
    /// - `to_fmt`: The thing to format.
    ///
    /// # Returns
    /// A new BlockFormatter instance.
    #[inline]
    pub fn new(to_fmt: S1) -> Self {
        Self {
            to_fmt,
        }
    }
}
impl<S1> Display for BlockFormatter<S1>
where
    S1: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        writeln!(f, "{}\n{}\n{}",
            (0..80).map(|_| '-').collect::<String>(),
            self.to_fmt,
            (0..80).map(|_| '-').collect::<String>(),
        )
    }
}



/// A helper struct that implements Display for a given iterator that prints it like a human-readable list.
pub struct PrettyListFormatter<'a, I> {
    /// The list to print.
    iter : RefCell<I>,
    /// The word to use as a connector word at the end.
    word : &'a str,
}
impl<'a, I> PrettyListFormatter<'a, I> {
    /// Constructor for the PrettyListFormatter.
    ///
    /// # Arguments
    /// - `iter`: The list to prettyprint.
    /// - `word`: The word to use at the end of the list (e.g., `and` or `or`).
    ///
    /// # Returns
    /// A new instance of the PrettyListFormatter that can be used to show the given iterator as a pretty list.
    #[inline]
    pub fn new(iter: I, word: &'a str) -> Self {
        Self {
            iter : RefCell::new(iter),
            word,
        }
    }
}
impl<'a, I> Display for PrettyListFormatter<'a, I>
where
    I: Iterator,
    <I as Iterator>::Item: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        let mut list: RefMut<I> = self.iter.borrow_mut();

        let mut first     : bool                          = true;
        let mut lookahead : Option<<I as Iterator>::Item> = list.next();
        while let Some(item) = lookahead.take() {
            lookahead = list.next();

            // If this isn't the first one, print a thing in between
            if first { first = false; }
            else if lookahead.is_some() {
                write!(f, ", ")?;
            } else {
                write!(f, " {} ", self.word)?;
            }

            write!(f, "{}", item)?;
        }

        Ok(())
    }
}
