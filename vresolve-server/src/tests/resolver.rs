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
use super::test_resolver;
use pretty_assertions::assert_eq;
use vresolve_common::{ResolveFlags, ResolvedAddr};

fn resolved(
    transport: &str,
    nexthop: &str,
    recipient: &str,
    flags: ResolveFlags,
) -> ResolvedAddr {
    ResolvedAddr {
        transport: transport.to_string(),
        nexthop: nexthop.to_string(),
        recipient: recipient.to_string(),
        flags,
    }
}

#[test]
fn local_recipient() {
    let engine = test_resolver(|_| {});
    assert_eq!(
        engine.resolve_addr("user@myhost"),
        resolved("local", "myhost", "user@myhost", ResolveFlags::CLASS_LOCAL)
    );
}

#[test]
fn default_destination() {
    let engine = test_resolver(|_| {});
    assert_eq!(
        engine.resolve_addr("u@ext.example"),
        resolved(
            "smtp",
            "ext.example",
            "u@ext.example",
            ResolveFlags::CLASS_DEFAULT
        )
    );
}

#[test]
fn relayhost_overrides_the_default_destination() {
    let engine = test_resolver(|config| {
        config.resolver.relayhost = "[gw]".to_string();
    });
    assert_eq!(
        engine.resolve_addr("u@ext.example"),
        resolved("smtp", "[gw]", "u@ext.example", ResolveFlags::CLASS_DEFAULT)
    );
}

#[test]
fn virtual_mailbox_domain() {
    let engine = test_resolver(|config| {
        config.resolver.virt_mailbox_doms = vec!["v.example".to_string()];
    });
    assert_eq!(
        engine.resolve_addr("u@v.example"),
        resolved(
            "virtual",
            "v.example",
            "u@v.example",
            ResolveFlags::CLASS_VIRTUAL
        )
    );
}

#[test]
fn virtual_alias_domain_bounces() {
    let engine = test_resolver(|config| {
        config.resolver.virt_alias_doms = vec!["a.example".to_string()];
    });
    assert_eq!(
        engine.resolve_addr("u@a.example"),
        resolved(
            "error",
            "User unknown",
            "u@a.example",
            ResolveFlags::CLASS_ALIAS
        )
    );
}

#[test]
fn source_routed_submission_is_flagged() {
    let engine = test_resolver(|config| {
        config.resolver.resolve_dequoted = false;
    });
    assert_eq!(
        engine.resolve_addr("attacker@hop@remote"),
        resolved(
            "smtp",
            "remote",
            "attacker@hop@remote",
            ResolveFlags::CLASS_DEFAULT | ResolveFlags::FLAG_ROUTED
        )
    );
}

#[test]
fn quoted_routing_characters_stay_invisible_when_dequoted() {
    let engine = test_resolver(|config| {
        config.resolver.resolve_dequoted = true;
    });
    let result = engine.resolve_addr(r#""user@hop"@remote"#);
    assert!(!result.flags.contains(ResolveFlags::FLAG_ROUTED));
    assert_eq!(result.flags.class(), ResolveFlags::CLASS_DEFAULT);
    assert_eq!(result.nexthop, "remote");
    assert_eq!(result.recipient, "user@hop@remote");
}

#[test]
fn relocated_recipient_bounces() {
    let engine = test_resolver(|config| {
        config.resolver.relocated_maps =
            vec!["inline:{moved@myhost=new@elsewhere}".to_string()];
    });
    assert_eq!(
        engine.resolve_addr("moved@myhost"),
        resolved(
            "error",
            "user has moved to new@elsewhere",
            "moved@myhost",
            ResolveFlags::CLASS_LOCAL
        )
    );
}

#[test]
fn empty_address_becomes_the_postmaster() {
    let engine = test_resolver(|_| {});
    assert_eq!(
        engine.resolve_addr(""),
        resolved(
            "local",
            "myhost",
            "postmaster@myhost",
            ResolveFlags::CLASS_LOCAL
        )
    );
}

#[test]
fn trailing_dot_is_trimmed_but_dot_dot_is_not() {
    let engine = test_resolver(|_| {});
    assert_eq!(
        engine.resolve_addr("u@ext.example."),
        resolved(
            "smtp",
            "ext.example",
            "u@ext.example",
            ResolveFlags::CLASS_DEFAULT
        )
    );

    let bogus = engine.resolve_addr("u@ext.example..");
    assert!(bogus.flags.contains(ResolveFlags::FLAG_ERROR));
    assert_eq!(bogus.nexthop, "ext.example..");
}

#[test]
fn trailing_at_sign_is_stripped() {
    let engine = test_resolver(|_| {});
    assert_eq!(
        engine.resolve_addr("user@"),
        resolved("local", "myhost", "user@myhost", ResolveFlags::CLASS_LOCAL)
    );
}

#[test]
fn local_domain_is_peeled_repeatedly() {
    let engine = test_resolver(|_| {});
    assert_eq!(
        engine.resolve_addr("user@myhost@myhost"),
        resolved("local", "myhost", "user@myhost", ResolveFlags::CLASS_LOCAL)
    );
}

#[test]
fn percent_hack() {
    let engine = test_resolver(|_| {});
    assert_eq!(
        engine.resolve_addr("u%ext.example"),
        resolved(
            "smtp",
            "ext.example",
            "u@ext.example",
            ResolveFlags::CLASS_DEFAULT
        )
    );

    // with the hack disabled the operator is ordinary text and the
    // recipient is anchored on this host.
    let engine = test_resolver(|config| {
        config.resolver.percent_hack = false;
    });
    assert_eq!(
        engine.resolve_addr("u%ext.example"),
        resolved(
            "local",
            "myhost",
            "u%ext.example@myhost",
            ResolveFlags::CLASS_LOCAL
        )
    );
}

#[test]
fn bangpath_swap() {
    let engine = test_resolver(|_| {});
    assert_eq!(
        engine.resolve_addr("ext.example!u"),
        resolved(
            "smtp",
            "ext.example",
            "u@ext.example",
            ResolveFlags::CLASS_DEFAULT
        )
    );
}

#[test]
fn alias_wins_over_mailbox_when_both_match() {
    let engine = test_resolver(|config| {
        config.resolver.virt_alias_doms = vec!["both.example".to_string()];
        config.resolver.virt_mailbox_doms = vec!["both.example".to_string()];
    });
    let result = engine.resolve_addr("u@both.example");
    assert_eq!(result.flags.class(), ResolveFlags::CLASS_ALIAS);
    assert_eq!(result.transport, "error");
    assert_eq!(result.nexthop, "User unknown");
}

#[test]
fn relay_domain_matches_subdomains() {
    let engine = test_resolver(|config| {
        config.resolver.relay_domains = vec!["customer.example".to_string()];
    });
    assert_eq!(
        engine.resolve_addr("u@mail.customer.example"),
        resolved(
            "relay",
            "mail.customer.example",
            "u@mail.customer.example",
            ResolveFlags::CLASS_RELAY
        )
    );
}

#[test]
fn transport_with_its_own_nexthop() {
    let engine = test_resolver(|config| {
        config.resolver.def_transport = "smtp:[mx]".to_string();
    });
    assert_eq!(
        engine.resolve_addr("u@ext.example"),
        resolved("smtp", "[mx]", "u@ext.example", ResolveFlags::CLASS_DEFAULT)
    );

    let engine = test_resolver(|config| {
        config.resolver.local_transport = "local:otherhost".to_string();
    });
    assert_eq!(
        engine.resolve_addr("user@myhost"),
        resolved("local", "otherhost", "user@myhost", ResolveFlags::CLASS_LOCAL)
    );
}

#[test]
fn relayhost_does_not_override_virtual_classes() {
    let engine = test_resolver(|config| {
        config.resolver.relayhost = "[gw]".to_string();
        config.resolver.virt_mailbox_doms = vec!["v.example".to_string()];
        config.resolver.virt_alias_doms = vec!["a.example".to_string()];
        config.resolver.relay_domains = vec!["r.example".to_string()];
    });

    assert_eq!(engine.resolve_addr("u@v.example").nexthop, "v.example");
    assert_eq!(engine.resolve_addr("u@a.example").nexthop, "User unknown");
    // relay destinations are overridden like the default class.
    assert_eq!(engine.resolve_addr("u@r.example").nexthop, "[gw]");
    assert_eq!(engine.resolve_addr("u@other.example").nexthop, "[gw]");
}

#[test]
fn transport_map_overrides_transport_and_nexthop() {
    let engine = test_resolver(|config| {
        config.resolver.transport_maps =
            vec!["inline:{ext.example=relay2:[gw2]}".to_string()];
    });
    assert_eq!(
        engine.resolve_addr("u@ext.example"),
        resolved(
            "relay2",
            "[gw2]",
            "u@ext.example",
            ResolveFlags::CLASS_DEFAULT
        )
    );
}

#[test]
fn transport_map_entries_may_be_partial() {
    // no colon: only the transport changes.
    let engine = test_resolver(|config| {
        config.resolver.transport_maps = vec!["inline:{ext.example=bulk}".to_string()];
    });
    assert_eq!(
        engine.resolve_addr("u@ext.example"),
        resolved("bulk", "ext.example", "u@ext.example", ResolveFlags::CLASS_DEFAULT)
    );

    // empty transport: only the next hop changes.
    let engine = test_resolver(|config| {
        config.resolver.transport_maps = vec!["inline:{ext.example=:[onlyhop]}".to_string()];
    });
    assert_eq!(
        engine.resolve_addr("u@ext.example"),
        resolved("smtp", "[onlyhop]", "u@ext.example", ResolveFlags::CLASS_DEFAULT)
    );
}

#[test]
fn transport_map_never_overrides_the_error_transport() {
    let engine = test_resolver(|config| {
        config.resolver.relocated_maps = vec!["inline:{moved@myhost=new@elsewhere}".to_string()];
        config.resolver.transport_maps = vec!["inline:{moved@myhost=smtp2:[other]}".to_string()];
    });
    assert_eq!(
        engine.resolve_addr("moved@myhost"),
        resolved(
            "error",
            "user has moved to new@elsewhere",
            "moved@myhost",
            ResolveFlags::CLASS_LOCAL
        )
    );

    // alias-domain bounces are protected the same way.
    let engine = test_resolver(|config| {
        config.resolver.virt_alias_doms = vec!["a.example".to_string()];
        config.resolver.transport_maps = vec!["inline:{u@a.example=smtp2:[other]}".to_string()];
    });
    assert_eq!(engine.resolve_addr("u@a.example").transport, "error");
}

#[test]
fn transient_failure_at_each_lookup_site() {
    // virtual alias domains.
    let engine = test_resolver(|config| {
        config.resolver.virt_alias_doms = vec!["fail:".to_string()];
    });
    let result = engine.resolve_addr("u@ext.example");
    assert!(result.flags.contains(ResolveFlags::FLAG_FAIL));
    assert_eq!(result.flags.class(), ResolveFlags::empty());
    assert_eq!(result.recipient, "u@ext.example");

    // virtual mailbox domains.
    let engine = test_resolver(|config| {
        config.resolver.virt_mailbox_doms = vec!["fail:".to_string()];
    });
    assert!(engine
        .resolve_addr("u@ext.example")
        .flags
        .contains(ResolveFlags::FLAG_FAIL));

    // relay domains: the relayhost override still applies, the reply
    // carries the partial result.
    let engine = test_resolver(|config| {
        config.resolver.relay_domains = vec!["fail:".to_string()];
        config.resolver.relayhost = "[gw]".to_string();
    });
    let result = engine.resolve_addr("u@ext.example");
    assert!(result.flags.contains(ResolveFlags::FLAG_FAIL));
    assert_eq!(result.nexthop, "[gw]");
    assert_eq!(result.transport, "");

    // relocated maps: classification survives in the partial result.
    let engine = test_resolver(|config| {
        config.resolver.relocated_maps = vec!["fail:".to_string()];
    });
    let result = engine.resolve_addr("user@myhost");
    assert!(result.flags.contains(ResolveFlags::FLAG_FAIL));
    assert_eq!(result.flags.class(), ResolveFlags::CLASS_LOCAL);
    assert_eq!(result.transport, "local");
    assert_eq!(result.nexthop, "myhost");

    // transport maps.
    let engine = test_resolver(|config| {
        config.resolver.transport_maps = vec!["fail:".to_string()];
    });
    let result = engine.resolve_addr("u@ext.example");
    assert!(result.flags.contains(ResolveFlags::FLAG_FAIL));
    assert_eq!(result.flags.class(), ResolveFlags::CLASS_DEFAULT);
    assert_eq!(result.transport, "smtp");
}

#[test]
fn null_transport_is_downgraded_to_a_soft_failure() {
    let engine = test_resolver(|config| {
        config.resolver.def_transport = String::new();
    });
    let result = engine.resolve_addr("u@ext.example");
    assert!(result.flags.contains(ResolveFlags::FLAG_FAIL));

    let engine = test_resolver(|config| {
        config.resolver.local_transport = String::new();
    });
    let result = engine.resolve_addr("user@myhost");
    assert!(result.flags.contains(ResolveFlags::FLAG_FAIL));
}

#[test]
fn malformed_nexthop_is_flagged_but_still_classified() {
    let engine = test_resolver(|_| {});
    let result = engine.resolve_addr("u@under_score.example");
    assert!(result.flags.contains(ResolveFlags::FLAG_ERROR));
    assert_eq!(result.flags.class(), ResolveFlags::CLASS_DEFAULT);

    // address literals and all-numeric next hops are exempt.
    assert!(!engine
        .resolve_addr("u@[127.0.0.1]")
        .flags
        .contains(ResolveFlags::FLAG_ERROR));
}

#[test]
fn recipient_always_has_a_domain() {
    let engine = test_resolver(|_| {});
    assert_eq!(engine.resolve_addr("user").recipient, "user@myhost");
    assert_eq!(engine.resolve_addr("user@myhost.").recipient, "user@myhost");
}

#[test]
fn resolution_is_idempotent() {
    let engine = test_resolver(|config| {
        config.resolver.relay_domains = vec!["customer.example".to_string()];
    });

    for addr in ["user@myhost", "u@ext.example", "u@mail.customer.example"] {
        let first = engine.resolve_addr(addr);
        let again = engine.resolve_addr(&first.recipient);
        assert_eq!(first, again);
    }
}

#[test]
fn extension_stripping_in_relocated_lookups() {
    let engine = test_resolver(|config| {
        config.resolver.recipient_delimiter = "+".to_string();
        config.resolver.relocated_maps = vec!["inline:{moved@myhost=new@elsewhere}".to_string()];
    });
    assert_eq!(
        engine.resolve_addr("moved+tag@myhost").transport,
        "error"
    );
}

#[test]
fn mydestination_extends_the_local_domains() {
    let engine = test_resolver(|config| {
        config.resolver.mydestination.push("alt.example".to_string());
    });
    assert!(engine.locals().is_local_domain("alt.example"));
    assert!(engine.locals().is_local_domain("myhost"));

    assert_eq!(
        engine.resolve_addr("user@alt.example"),
        resolved("local", "myhost", "user@alt.example", ResolveFlags::CLASS_LOCAL)
    );
}

#[test]
fn domains_are_lowercased_in_the_nexthop() {
    let engine = test_resolver(|_| {});
    let result = engine.resolve_addr("u@ExT.Example");
    assert_eq!(result.nexthop, "ext.example");
    // the recipient keeps the submitted spelling.
    assert_eq!(result.recipient, "u@ExT.Example");
}
