fn main() -> anyhow::Result<()> {
    let mut input = std::io::stdin().lock();
    let mut out = std::io::stdout();

    let mut engine = skiff::engine::Engine::new(&mut input, &mut out);
    engine.uci_loop()
}
