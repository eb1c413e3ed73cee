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
use crate::local::LocalDomains;
use crate::rewrite::{CanonRewrite, Rewrite, REWRITE_CANON};
use crate::table::{AddrMap, DomainList, LookupOutcome};
use vresolve_common::hostname::valid_hostname;
use vresolve_common::{Address, ResolveFlags, ResolvedAddr, Token, TokenTree};
use vresolve_config::{log_channel::RESOLVER, Config};

/// substituted for an empty recipient.
const MAIL_ADDR_POSTMASTER: &str = "postmaster";

/// characters a next hop may consist of without looking like a hostname.
const HOSTNAME_EXEMPT: &str = "[]0123456789.";

/// the address resolving engine.
///
/// owns the lookup tables and the configuration snapshot; both are
/// immutable once built, so one engine serves any number of sequential
/// requests without locking.
pub struct Resolver {
    config: std::sync::Arc<Config>,
    locals: LocalDomains,
    rewrite: Box<dyn Rewrite + Send + Sync>,
    relay_domains: Option<DomainList>,
    virt_alias_doms: Option<DomainList>,
    virt_mailbox_doms: Option<DomainList>,
    relocated_maps: Option<AddrMap>,
    transport_maps: Option<AddrMap>,
}

impl Resolver {
    /// build the engine and its table set from the configuration.
    ///
    /// tables whose parameter is empty are left absent and never match.
    /// the relay domain list matches subdomains of its patterns.
    ///
    /// # Errors
    ///
    /// * a table source is malformed or unreadable
    pub fn new(config: std::sync::Arc<Config>) -> anyhow::Result<Self> {
        let rewrite = Box::new(CanonRewrite {
            swap_bangpath: config.resolver.swap_bangpath,
            percent_hack: config.resolver.percent_hack,
        });
        Self::with_rewrite(config, rewrite)
    }

    /// build the engine with a caller-provided canonicalizer.
    ///
    /// # Errors
    ///
    /// * a table source is malformed or unreadable
    pub fn with_rewrite(
        config: std::sync::Arc<Config>,
        rewrite: Box<dyn Rewrite + Send + Sync>,
    ) -> anyhow::Result<Self> {
        let resolver = &config.resolver;
        Ok(Self {
            locals: LocalDomains::new(&config.server.domain, &resolver.mydestination),
            relay_domains: DomainList::parent("relay_domains", &resolver.relay_domains)?,
            virt_alias_doms: DomainList::literal("virt_alias_doms", &resolver.virt_alias_doms)?,
            virt_mailbox_doms: DomainList::literal(
                "virt_mailbox_doms",
                &resolver.virt_mailbox_doms,
            )?,
            relocated_maps: AddrMap::from_sources("relocated_maps", &resolver.relocated_maps)?,
            transport_maps: AddrMap::from_sources("transport_maps", &resolver.transport_maps)?,
            rewrite,
            config,
        })
    }

    /// the `is_local_domain` predicate the engine peels with.
    #[must_use]
    pub const fn locals(&self) -> &LocalDomains {
        &self.locals
    }

    /// resolve one internalized recipient to a (transport, nexthop,
    /// recipient) triple plus its flag word.
    ///
    /// # Panics
    ///
    /// * a success path produced an empty next hop (programmer error)
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn resolve_addr(&self, addr: &str) -> ResolvedAddr {
        let params = &self.config.resolver;
        let delimiter = params.recipient_delimiter.chars().next();
        let mut flags = ResolveFlags::empty();

        // the address comes in internalized (unquoted) form. requoting
        // it first while keeping @ non-special exposes extra @
        // characters, which blocks source-routed relay attempts;
        // looking at the raw form instead keeps routing characters
        // inside quoted local parts invisible. the configuration picks.
        let mut tree = if params.resolve_dequoted {
            TokenTree::scan(addr)
        } else {
            TokenTree::scan_requoted(addr)
        };

        let mut saved_domain: Option<TokenTree> = None;
        let mut domain: Option<usize> = None;

        // preliminary resolver: strip every instance of the local
        // domain. terminate when no destination domain is left over, or
        // when the destination domain is remote.
        while !tree.is_empty() {
            // strip a trailing dot at the end of the domain, but not
            // dot-dot. leaves bogus addresses alone so diagnostics stay
            // accurate.
            if tree.last().map_or(false, |token| token.is_special('.'))
                && tree.rfind_special('@').is_some()
                && !tree
                    .len()
                    .checked_sub(2)
                    .and_then(|idx| tree.get(idx))
                    .map_or(false, |token| token.is_special('.'))
            {
                tree.sub_keep_before(tree.len() - 1);
            }

            // strip a trailing @.
            if tree.last().map_or(false, |token| token.is_special('@')) {
                tree.sub_keep_before(tree.len() - 1);
                continue;
            }

            // a lone empty string becomes the postmaster.
            if tree.len() == 1
                && matches!(tree.get(0), Some(Token::QuotedString(text)) if text.is_empty())
            {
                tree.replace(TokenTree::scan(MAIL_ADDR_POSTMASTER));
                self.rewrite.rewrite(REWRITE_CANON, &mut tree);
            }

            // strip (and save) @domain if local.
            domain = tree.rfind_special('@');
            if let Some(at) = domain {
                if !self
                    .locals
                    .is_local_domain(&tree.internalize_from(at + 1))
                {
                    break;
                }
                saved_domain = Some(tree.sub_keep_before(at));
            }

            // after stripping the local domain, if any, replace foo%bar
            // by foo@bar, site!user by user@site, rewrite to canonical
            // form, and retry. otherwise we're done.
            if tree.rfind_special('@').is_some()
                || (params.swap_bangpath && tree.rfind_special('!').is_some())
                || (params.percent_hack && tree.rfind_special('%').is_some())
            {
                self.rewrite.rewrite(REWRITE_CANON, &mut tree);
            } else {
                domain = None;
                break;
            }
        }

        // with a non-local destination, recognize routing operators in
        // the localpart. local swap_bangpath and percent_hack settings
        // are ignored here: a backup MX cannot know how the primary is
        // set up, so operators from a relay peer always count.
        if let Some(at) = domain {
            if at > 0 && tree.has_routing_operator_before(at) {
                flags |= ResolveFlags::FLAG_ROUTED;
            }
        }

        // make sure the resolved envelope recipient has the user@domain
        // form. if no domain was specified in the address, assume the
        // local machine.
        if domain.is_none() {
            if let Some(saved) = saved_domain.take() {
                tree.sub_append(saved);
            } else {
                tree.push(Token::Special('@'));
                tree.sub_append(TokenTree::scan(&self.config.server.domain));
            }
        }
        let nextrcpt = tree.internalize();

        let mut channel = String::new();
        let mut nexthop = String::new();
        let mut blame: Option<&str> = None;

        if let Some(at) = domain {
            // remote destination: classify, first match wins.
            nexthop = tree.internalize_from(at + 1).to_lowercase();
            if nexthop.chars().any(|ch| !HOSTNAME_EXEMPT.contains(ch))
                && !valid_hostname(&nexthop)
            {
                flags |= ResolveFlags::FLAG_ERROR;
            }

            match opt_matches(&self.virt_alias_doms, &nexthop) {
                LookupOutcome::Found(()) => {
                    // aliases-only domains have no local mailbox;
                    // bounce here instead of after a delivery attempt.
                    if opt_matches(&self.virt_mailbox_doms, &nexthop).is_found() {
                        log::warn!(
                            target: RESOLVER,
                            "do not list domain {} in BOTH virt_alias_doms and virt_mailbox_doms",
                            nexthop
                        );
                    }
                    channel = params.error_transport.clone();
                    nexthop = "User unknown".to_string();
                    blame = Some("error_transport");
                    flags |= ResolveFlags::CLASS_ALIAS;
                }
                LookupOutcome::Transient => {
                    log::warn!(target: RESOLVER, "virt_alias_doms lookup failure");
                    flags |= ResolveFlags::FLAG_FAIL;
                }
                LookupOutcome::NotFound => match opt_matches(&self.virt_mailbox_doms, &nexthop) {
                    LookupOutcome::Found(()) => {
                        channel = params.virt_transport.clone();
                        blame = Some("virt_transport");
                        flags |= ResolveFlags::CLASS_VIRTUAL;
                    }
                    LookupOutcome::Transient => {
                        log::warn!(target: RESOLVER, "virt_mailbox_doms lookup failure");
                        flags |= ResolveFlags::FLAG_FAIL;
                    }
                    LookupOutcome::NotFound => {
                        match opt_matches(&self.relay_domains, &nexthop) {
                            LookupOutcome::Found(()) => {
                                channel = params.relay_transport.clone();
                                blame = Some("relay_transport");
                                flags |= ResolveFlags::CLASS_RELAY;
                            }
                            LookupOutcome::Transient => {
                                log::warn!(target: RESOLVER, "relay_domains lookup failure");
                                flags |= ResolveFlags::FLAG_FAIL;
                            }
                            LookupOutcome::NotFound => {
                                channel = params.def_transport.clone();
                                blame = Some("def_transport");
                                flags |= ResolveFlags::CLASS_DEFAULT;
                            }
                        }
                        // the relayhost setting overrides relay and
                        // other non-local destination domains, never
                        // the virtual classes.
                        if !params.relayhost.is_empty() {
                            nexthop = params.relayhost.clone();
                        }
                    }
                },
            }

            if let Some(colon) = channel.find(':') {
                let destination = channel[colon + 1..].to_string();
                channel.truncate(colon);
                if !destination.is_empty() {
                    nexthop = destination;
                }
            }
        } else {
            // local delivery: the default local transport, next hop is
            // this machine unless the transport names its own.
            let rcpt = Address::new_unchecked(nextrcpt.clone());
            if !rcpt.domain().is_empty() {
                if opt_matches(&self.virt_alias_doms, rcpt.domain()).is_found() {
                    log::warn!(
                        target: RESOLVER,
                        "do not list domain {} in BOTH mydestination and virt_alias_doms",
                        rcpt.domain()
                    );
                }
                if opt_matches(&self.virt_mailbox_doms, rcpt.domain()).is_found() {
                    log::warn!(
                        target: RESOLVER,
                        "do not list domain {} in BOTH mydestination and virt_mailbox_doms",
                        rcpt.domain()
                    );
                }
            }

            channel = params.local_transport.clone();
            blame = Some("local_transport");
            let destination = match channel.find(':') {
                Some(colon) => {
                    let destination = channel[colon + 1..].to_string();
                    channel.truncate(colon);
                    destination
                }
                None => String::new(),
            };
            nexthop = if destination.is_empty() {
                self.config.server.domain.clone()
            } else {
                destination
            };
            flags |= ResolveFlags::CLASS_LOCAL;
        }

        // sanity checks.
        if !flags.contains(ResolveFlags::FLAG_FAIL) {
            if channel.is_empty() {
                match blame {
                    Some(parameter) => {
                        log::warn!(
                            target: RESOLVER,
                            "parameter {}: null transport is not allowed",
                            parameter
                        );
                        flags |= ResolveFlags::FLAG_FAIL;
                    }
                    None => panic!("resolve_addr: null blame"),
                }
            }
            assert!(!nexthop.is_empty(), "resolve_addr: null nexthop");
        }

        // bounce recipients that have moved. doing it here instead of
        // in the local delivery agent also covers virtual addresses.
        if !flags.contains(ResolveFlags::FLAG_FAIL) {
            if let Some(relocated) = &self.relocated_maps {
                let rcpt = Address::new_unchecked(nextrcpt.clone());
                match relocated.find_addr(&rcpt, delimiter) {
                    LookupOutcome::Found(newloc) => {
                        channel = params.error_transport.clone();
                        nexthop = format!("user has moved to {newloc}");
                    }
                    LookupOutcome::Transient => {
                        log::warn!(target: RESOLVER, "relocated_maps lookup failure");
                        flags |= ResolveFlags::FLAG_FAIL;
                    }
                    LookupOutcome::NotFound => {}
                }
            }
        }

        // the transport map overrides any transport and next-hop info
        // set up above. don't override the error transport :-(
        if !flags.contains(ResolveFlags::FLAG_FAIL) && channel != params.error_transport {
            if let Some(transports) = &self.transport_maps {
                let rcpt = Address::new_unchecked(nextrcpt.clone());
                match transports.find_transport(&rcpt, delimiter) {
                    LookupOutcome::Found(entry) => {
                        let (transport, destination) = entry
                            .split_once(':')
                            .map_or((entry.as_str(), ""), |(t, d)| (t, d));
                        if !transport.is_empty() {
                            channel = transport.to_string();
                        }
                        if !destination.is_empty() {
                            nexthop = destination.to_string();
                        }
                    }
                    LookupOutcome::Transient => {
                        log::warn!(target: RESOLVER, "transport_maps lookup failure");
                        flags |= ResolveFlags::FLAG_FAIL;
                    }
                    LookupOutcome::NotFound => {}
                }
            }
        }

        ResolvedAddr {
            transport: channel,
            nexthop,
            recipient: nextrcpt,
            flags,
        }
    }
}

fn opt_matches(list: &Option<DomainList>, domain: &str) -> LookupOutcome<()> {
    list.as_ref()
        .map_or(LookupOutcome::NotFound, |list| list.matches(domain))
}
