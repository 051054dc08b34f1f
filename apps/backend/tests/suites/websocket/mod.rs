mod chat_tests;
mod matchmaking_tests;
mod ranking_tests;
mod room_tests;
