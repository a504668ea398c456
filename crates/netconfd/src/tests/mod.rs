//! Behavioural tests for the NETCONF server.
