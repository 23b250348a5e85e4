// Terminal front end for the nightwatch spectator.

pub mod tui;
