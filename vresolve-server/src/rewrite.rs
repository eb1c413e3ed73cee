/*
 * vSMTP mail transfer agent
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 *  This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/
use vresolve_common::{Token, TokenTree};

/// name of the canonicalization ruleset.
pub const REWRITE_CANON: &str = "canonicalize";

/// a one-shot, in-place transformation of a token tree under a named
/// ruleset.
///
/// the resolver treats the rewriter as a black box: the only contract
/// is that the tree stays an address and that routing-operator content
/// may change.
pub trait Rewrite {
    /// replace the tree with its rewritten form.
    fn rewrite(&self, ruleset: &str, tree: &mut TokenTree);
}

/// the standard canonicalizer.
///
/// an address that already carries `@` is left alone. otherwise
/// `site!user` becomes `user@site` when bangpath swapping is enabled,
/// then `user%domain` becomes `user@domain` when the percent hack is
/// enabled (rightmost `%` wins).
#[derive(Debug, Clone, Copy)]
pub struct CanonRewrite {
    /// rewrite `site!user` into `user@site`.
    pub swap_bangpath: bool,
    /// rewrite `user%domain` into `user@domain`.
    pub percent_hack: bool,
}

impl Rewrite for CanonRewrite {
    fn rewrite(&self, ruleset: &str, tree: &mut TokenTree) {
        if ruleset != REWRITE_CANON || tree.rfind_special('@').is_some() {
            return;
        }

        if self.swap_bangpath {
            if let Some(bang) = tree.find_special('!') {
                let mut rest = tree.sub_keep_before(bang);
                rest.split_off_first();
                rest.push(Token::Special('@'));
                rest.sub_append(std::mem::take(tree));
                *tree = rest;
                return;
            }
        }

        if self.percent_hack {
            if let Some(percent) = tree.rfind_special('%') {
                tree.set(percent, Token::Special('@'));
            }
        }
    }
}
